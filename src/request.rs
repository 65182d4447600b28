use reqwest::{header, Method};
use serde::Serialize;

use crate::{Error, Result};

/// Media type applied to structured bodies when the caller gives none.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Outgoing request body, resolved once at the call boundary.
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Caller-supplied stream, sent as is. Cannot be replayed on retry.
    Stream(reqwest::Body),
    Bytes(Vec<u8>),
    Text(String),
    /// Serialized JSON produced by [`RequestBody::json`].
    Structured(Vec<u8>),
}

impl RequestBody {
    /// Serializes `value` as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_vec(value)
            .map(Self::Structured)
            .map_err(Error::Encoding)
    }

    /// Content type implied by the body kind, if any.
    fn default_content_type(&self) -> Option<&'static str> {
        match self {
            Self::Structured(_) => Some(JSON_CONTENT_TYPE),
            _ => None,
        }
    }

    fn into_reqwest(self) -> Option<reqwest::Body> {
        match self {
            Self::Empty => None,
            Self::Stream(body) => Some(body),
            Self::Bytes(bytes) | Self::Structured(bytes) => Some(bytes.into()),
            Self::Text(text) => Some(text.into()),
        }
    }
}

impl From<()> for RequestBody {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for RequestBody {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<reqwest::Body> for RequestBody {
    fn from(body: reqwest::Body) -> Self {
        Self::Stream(body)
    }
}

/// Builds a request ready for the retry loop.
///
/// An empty or missing `content_type` falls back to the body's implied type;
/// the header is only set when a type is known.
pub(crate) fn build_request(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    content_type: Option<&str>,
    body: RequestBody,
) -> Result<reqwest::Request> {
    let content_type = content_type
        .filter(|value| !value.is_empty())
        .or_else(|| body.default_content_type());

    let mut builder = http.request(method, url);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(body) = body.into_reqwest() {
        builder = builder.body(body);
    }
    builder.build().map_err(Error::InvalidRequest)
}
