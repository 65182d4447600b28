//! `resilient-http` is an outbound HTTP client for calling external services.
//!
//! A [`Client`] owns one pooled `reqwest` transport (TLS 1.2+, optional
//! mutual TLS and proxy) and wraps every call in bounded retry:
//! - network failures and 5xx responses are retried with exponential backoff
//! - 4xx responses are returned to the caller untouched
//! - redirect chains stop after [`MAX_REDIRECTS`] hops
//!
//! Bodies go in through [`RequestBody`] and come out through
//! [`decode_json`], [`read_body`] and [`read_body_text`].

mod client;
mod error;
mod logger;
mod options;
mod redirect;
mod request;
mod response;
mod retry;
mod transport;

pub use client::Client;
pub use error::Error;
pub use logger::{LogLevel, Logger, NoopLogger, TracingLogger};
pub use options::{ClientOptions, DEFAULT_USER_AGENT};
pub use redirect::MAX_REDIRECTS;
pub use request::{RequestBody, JSON_CONTENT_TYPE};
pub use response::{decode_json, read_body, read_body_text};
pub use retry::RetryPolicy;
pub use transport::TCP_KEEPALIVE;

pub use reqwest::{Method, Response, StatusCode};

pub type Result<T> = std::result::Result<T, Error>;
