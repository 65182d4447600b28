use std::{fmt, sync::Arc};

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method, Response,
};
use tokio::time::sleep;

use crate::{
    redirect::{redirect_limit_error, RedirectPolicy, MAX_REDIRECTS},
    request::build_request,
    transport::build_transport,
    ClientOptions, Error, Logger, RequestBody, Result, RetryPolicy, TracingLogger,
};

/// Outbound HTTP client with pooled connections and bounded retry.
///
/// Cloning is cheap and every clone shares the same connection pool, so one
/// client can serve many concurrent callers.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    retry: RetryPolicy,
    user_agent: HeaderValue,
    default_headers: HeaderMap,
    options: Arc<ClientOptions>,
    logger: Arc<dyn Logger>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<_> = self
            .default_headers
            .keys()
            .map(|name| format!("{name}: <redacted>"))
            .collect();
        f.debug_struct("Client")
            .field("retry", &self.retry)
            .field("user_agent", &self.user_agent)
            .field("default_headers", &headers)
            .field("proxy_url", &self.options.proxy_url)
            .finish()
    }
}

impl Client {
    /// Builds the pooled transport and retry policy.
    ///
    /// Fails with [`Error::Config`] for a malformed proxy URL, invalid default
    /// header or inverted backoff bounds, and with [`Error::Certificate`] when
    /// the client certificate cannot be loaded.
    pub fn new(options: ClientOptions, logger: Arc<dyn Logger>) -> Result<Self> {
        options.validate()?;

        let user_agent = HeaderValue::from_str(&options.user_agent)
            .map_err(|err| Error::Config(format!("invalid user agent: {err}")))?;
        let default_headers = parse_default_headers(&options)?;
        let redirect = RedirectPolicy::new(MAX_REDIRECTS, logger.clone());
        let http = build_transport(&options, redirect)?;

        Ok(Self {
            http,
            retry: RetryPolicy::from_options(&options),
            user_agent,
            default_headers,
            options: Arc::new(options),
            logger,
        })
    }

    /// Same as [`Client::new`] with a [`TracingLogger`].
    pub fn with_tracing(options: ClientOptions) -> Result<Self> {
        Self::new(options, Arc::new(TracingLogger))
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn get(&self, url: &str) -> Result<Response> {
        self.request(Method::GET, url, None, RequestBody::Empty).await
    }

    pub async fn head(&self, url: &str) -> Result<Response> {
        self.request(Method::HEAD, url, None, RequestBody::Empty).await
    }

    /// Sends `body` with `POST`.
    ///
    /// Structured bodies default the content type to `application/json`.
    pub async fn post(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: impl Into<RequestBody>,
    ) -> Result<Response> {
        self.request(Method::POST, url, content_type, body.into()).await
    }

    pub async fn put(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: impl Into<RequestBody>,
    ) -> Result<Response> {
        self.request(Method::PUT, url, content_type, body.into()).await
    }

    pub async fn patch(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: impl Into<RequestBody>,
    ) -> Result<Response> {
        self.request(Method::PATCH, url, content_type, body.into()).await
    }

    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.request(Method::DELETE, url, None, RequestBody::Empty).await
    }

    /// Builds a request for any method and runs it through [`Client::execute`].
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        content_type: Option<&str>,
        body: RequestBody,
    ) -> Result<Response> {
        let request = build_request(&self.http, method, url, content_type, body)?;
        self.execute(request).await
    }

    /// Runs `request` with default headers and bounded retry.
    ///
    /// Responses below 500 (including 4xx) are returned as is. Network
    /// failures and 5xx responses are retried up to `max_retries` times with
    /// exponential backoff; once exhausted the last failure is returned inside
    /// [`Error::RetriesExhausted`]. Redirect-limit and request-construction
    /// failures are returned on first occurrence.
    ///
    /// Dropping the returned future cancels the call, including a pending
    /// backoff sleep.
    pub async fn execute(&self, mut request: reqwest::Request) -> Result<Response> {
        self.apply_default_headers(request.headers_mut());
        let method = request.method().clone();
        let url = request.url().to_string();

        let mut attempts = 0usize;
        loop {
            attempts += 1;
            let replay = if self.retry.allows_retry(attempts) {
                let replay = request.try_clone();
                if replay.is_none() {
                    self.logger.warnf(format_args!(
                        "{method} {url}: request body cannot be replayed, retries disabled"
                    ));
                }
                replay
            } else {
                None
            };

            let failure = match self.http.execute(request).await {
                Ok(response) if !response.status().is_server_error() => {
                    self.logger.debugf(format_args!(
                        "Request completed: {method} {url} -> {} (attempt {attempts})",
                        response.status().as_u16()
                    ));
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    drop(response);
                    Error::ServerStatus { status }
                }
                Err(err) => classify_transport_error(err)?,
            };

            let Some(next) = replay else {
                self.logger.errorf(format_args!(
                    "Request failed after {attempts} attempts: {method} {url}: {failure}"
                ));
                return Err(Error::RetriesExhausted {
                    attempts,
                    last: Box::new(failure),
                });
            };

            self.logger
                .warnf(format_args!("Request failed, will retry: {failure}"));
            let wait = self.retry.backoff(attempts);
            self.logger.infof(format_args!(
                "Retrying request after {wait:?} (attempt {attempts}/{})",
                self.retry.max_retries
            ));
            sleep(wait).await;
            request = next;
        }
    }

    /// Issues a `GET` and fails unless the response status is 2xx.
    pub async fn health_check(&self, url: &str) -> Result<()> {
        let response = self.get(url).await?;
        let status = response.status();
        drop(response);

        if !status.is_success() {
            return Err(Error::Unhealthy {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Releases this handle's share of the connection pool.
    ///
    /// `reqwest` has no call to close idle connections, so dropping this handle
    /// is all that happens here. Idle sockets close only when `idle_conn_timeout`
    /// expires or the last clone of the client is dropped. Calls already in
    /// flight keep their own reference and run to completion.
    pub fn close(self) {
        self.logger.debug("Releasing idle http connections");
    }

    fn apply_default_headers(&self, headers: &mut HeaderMap) {
        if !headers.contains_key(header::USER_AGENT) {
            headers.insert(header::USER_AGENT, self.user_agent.clone());
        }
        for (name, value) in &self.default_headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

/// Separates retryable network failures from terminal ones.
fn classify_transport_error(err: reqwest::Error) -> Result<Error> {
    if let Some(redirect) = redirect_limit_error(&err) {
        return Err(redirect);
    }
    if err.is_builder() {
        return Err(Error::InvalidRequest(err));
    }
    Ok(Error::Network(err))
}

fn parse_default_headers(options: &ClientOptions) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(options.headers.len());
    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| Error::Config(format!("invalid header name '{name}': {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| Error::Config(format!("invalid value for header '{name}': {err}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
