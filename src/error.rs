/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid client configuration (malformed proxy URL, bad header, backoff bounds).
    #[error("config error: {0}")]
    Config(String),
    /// Client certificate or key could not be read or parsed.
    #[error("certificate error: {0}")]
    Certificate(String),
    /// Structured request body could not be serialized.
    #[error("encoding error: {0}")]
    Encoding(#[source] serde_json::Error),
    /// Request could not be built (for example an unparsable URL).
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] reqwest::Error),
    /// Transport-level failure from `reqwest`. Retried internally.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// Upstream answered with a 5xx status. Retried internally.
    #[error("server error: status {status}")]
    ServerStatus { status: u16 },
    /// Every attempt failed with a retryable condition.
    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total attempts made for the logical call.
        attempts: usize,
        /// Error observed on the final attempt.
        #[source]
        last: Box<Error>,
    },
    /// Redirect chain hit the hop limit.
    #[error("stopped after {hops} redirects")]
    TooManyRedirects { hops: usize },
    /// Response body could not be read.
    #[error("io error: {0}")]
    Io(#[source] reqwest::Error),
    /// Non-2xx response met while decoding a structured body.
    #[error("http error: {code} {status}")]
    HttpStatus { code: u16, status: String },
    /// Response body is not valid for the requested type.
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),
    /// Health check endpoint answered outside 2xx.
    #[error("health check failed: status {status}")]
    Unhealthy { status: u16 },
}

impl Error {
    /// Whether the retry loop absorbs this error and tries again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ServerStatus { .. })
    }

    /// Number of attempts recorded on an exhausted call.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Self::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
