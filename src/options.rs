use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use crate::{Error, Result};

/// User agent sent when the caller does not set one.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/1.0");

const ENV_PREFIX: &str = "HTTP_CLIENT_";

/// Configures pooling, TLS, proxy, retry and default headers.
///
/// Built once and handed to [`Client::new`](crate::Client::new); the client
/// never mutates it afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Overall per-attempt timeout, including reading the response.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub dial_timeout: Duration,
    /// TLS handshake budget, added on top of the dial timeout for the connect phase.
    pub tls_handshake_timeout: Duration,
    /// Total idle connections kept across hosts.
    ///
    /// `reqwest` only exposes a per-host cap, so this is carried for callers
    /// that inspect the configuration but not enforced by the pool.
    pub max_idle_conns: usize,
    /// Idle connections kept per host.
    pub max_idle_conns_per_host: usize,
    /// How long an idle pooled connection stays open.
    pub idle_conn_timeout: Duration,
    /// Accept any server certificate. Testing only.
    pub insecure_skip_verify: bool,
    /// PEM client certificate chain for mutual TLS.
    pub cert_file: Option<PathBuf>,
    /// PEM private key matching `cert_file`.
    pub key_file: Option<PathBuf>,
    /// Proxy used for every request, e.g. `http://proxy.corp:3128`.
    pub proxy_url: Option<String>,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Backoff before the first retry; doubles on each further retry.
    pub retry_wait_min: Duration,
    /// Ceiling for the backoff.
    pub retry_wait_max: Duration,
    pub user_agent: String,
    /// Headers set on every request, overriding caller values with the same name.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            dial_timeout: Duration::from_secs(10),
            tls_handshake_timeout: Duration::from_secs(10),
            max_idle_conns: 100,
            max_idle_conns_per_host: 10,
            idle_conn_timeout: Duration::from_secs(90),
            insecure_skip_verify: false,
            cert_file: None,
            key_file: None,
            proxy_url: None,
            max_retries: 3,
            retry_wait_min: Duration::from_secs(1),
            retry_wait_max: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: BTreeMap::new(),
        }
    }
}

impl ClientOptions {
    /// Reads `HTTP_CLIENT_*` environment variables on top of the defaults.
    ///
    /// Durations accept `300ms`, `10s`, `1m30s` style values and
    /// `HTTP_CLIENT_HEADERS` accepts `name:value,name:value`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientOptions::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut opts = Self::default();
        if let Some(value) = var("TIMEOUT") {
            opts.timeout = parse_duration("TIMEOUT", &value)?;
        }
        if let Some(value) = var("DIAL_TIMEOUT") {
            opts.dial_timeout = parse_duration("DIAL_TIMEOUT", &value)?;
        }
        if let Some(value) = var("TLS_TIMEOUT") {
            opts.tls_handshake_timeout = parse_duration("TLS_TIMEOUT", &value)?;
        }
        if let Some(value) = var("MAX_IDLE_CONNS") {
            opts.max_idle_conns = parse_number("MAX_IDLE_CONNS", &value)?;
        }
        if let Some(value) = var("MAX_IDLE_CONNS_PER_HOST") {
            opts.max_idle_conns_per_host = parse_number("MAX_IDLE_CONNS_PER_HOST", &value)?;
        }
        if let Some(value) = var("IDLE_CONN_TIMEOUT") {
            opts.idle_conn_timeout = parse_duration("IDLE_CONN_TIMEOUT", &value)?;
        }
        if let Some(value) = var("INSECURE_SKIP_VERIFY") {
            opts.insecure_skip_verify = parse_bool("INSECURE_SKIP_VERIFY", &value)?;
        }
        opts.cert_file = var("CERT_FILE").map(PathBuf::from);
        opts.key_file = var("KEY_FILE").map(PathBuf::from);
        opts.proxy_url = var("PROXY_URL");
        if let Some(value) = var("MAX_RETRIES") {
            opts.max_retries = parse_number("MAX_RETRIES", &value)?;
        }
        if let Some(value) = var("RETRY_WAIT_MIN") {
            opts.retry_wait_min = parse_duration("RETRY_WAIT_MIN", &value)?;
        }
        if let Some(value) = var("RETRY_WAIT_MAX") {
            opts.retry_wait_max = parse_duration("RETRY_WAIT_MAX", &value)?;
        }
        if let Some(value) = var("USER_AGENT") {
            opts.user_agent = value;
        }
        if let Some(value) = var("HEADERS") {
            opts.headers = parse_headers(&value)?;
        }

        opts.validate()?;
        Ok(opts)
    }

    /// Sets retry count and backoff bounds.
    pub fn with_retry(mut self, max_retries: usize, wait_min: Duration, wait_max: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_wait_min = wait_min;
        self.retry_wait_max = wait_max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Sets the PEM certificate chain and key used for mutual TLS.
    pub fn with_client_cert(mut self, cert_file: impl Into<PathBuf>, key_file: impl Into<PathBuf>) -> Self {
        self.cert_file = Some(cert_file.into());
        self.key_file = Some(key_file.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a default header; a later value for the same name replaces the earlier one.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Checks invariants that cannot be expressed in the field types.
    pub fn validate(&self) -> Result<()> {
        if self.retry_wait_min > self.retry_wait_max {
            return Err(Error::Config(format!(
                "retry_wait_min ({:?}) must not exceed retry_wait_max ({:?})",
                self.retry_wait_min, self.retry_wait_max
            )));
        }
        Ok(())
    }
}

fn parse_number(name: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{ENV_PREFIX}{name}: invalid number '{value}'")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Ok(true),
        "0" | "f" | "false" | "no" => Ok(false),
        _ => Err(Error::Config(format!(
            "{ENV_PREFIX}{name}: invalid boolean '{value}'"
        ))),
    }
}

/// Parses `name:value` pairs separated by commas.
fn parse_headers(value: &str) -> Result<BTreeMap<String, String>> {
    value
        .split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once(':').ok_or_else(|| {
                Error::Config(format!("{ENV_PREFIX}HEADERS: expected name:value, got '{pair}'"))
            })?;
            Ok((name.trim().to_owned(), value.trim().to_owned()))
        })
        .collect()
}

/// Parses durations written as a sequence of `<number><unit>` segments,
/// e.g. `250ms`, `10s`, `1h30m`, `1.5s`. Bare `0` is accepted.
pub(crate) fn parse_duration(name: &str, value: &str) -> Result<Duration> {
    let invalid = || Error::Config(format!("{ENV_PREFIX}{name}: invalid duration '{value}'"));

    if value == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    let mut rest = value;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let number: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        let segment =
            Duration::try_from_secs_f64(number * seconds_per_unit).map_err(|_| invalid())?;
        total = total.checked_add(segment).ok_or_else(invalid)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let opts = ClientOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.max_idle_conns, 100);
        assert_eq!(opts.max_idle_conns_per_host, 10);
        assert_eq!(opts.max_retries, 3);
        assert_eq!(opts.retry_wait_max, Duration::from_secs(30));
        assert_eq!(opts.user_agent, "resilient-http/1.0");
        assert!(opts.headers.is_empty());
    }

    #[test]
    fn parse_duration_accepts_compound_values() {
        assert_eq!(parse_duration("T", "250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("T", "1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("T", "1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("T", "0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_missing_or_unknown_units() {
        assert!(matches!(parse_duration("T", "10"), Err(Error::Config(_))));
        assert!(matches!(parse_duration("T", "10d"), Err(Error::Config(_))));
        assert!(matches!(parse_duration("T", "ms"), Err(Error::Config(_))));
    }

    #[test]
    fn parse_duration_rejects_overflowing_sum() {
        let err = parse_duration("TIMEOUT", "10000000000000000000s10000000000000000000s")
            .expect_err("sum beyond Duration::MAX must fail");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn from_lookup_overrides_defaults() {
        let opts = ClientOptions::from_lookup(lookup(&[
            ("HTTP_CLIENT_MAX_RETRIES", "5"),
            ("HTTP_CLIENT_RETRY_WAIT_MIN", "10ms"),
            ("HTTP_CLIENT_RETRY_WAIT_MAX", "2s"),
            ("HTTP_CLIENT_PROXY_URL", "http://proxy.local:3128"),
            ("HTTP_CLIENT_INSECURE_SKIP_VERIFY", "true"),
            ("HTTP_CLIENT_HEADERS", "X-Team:payments, X-Env:prod"),
        ]))
        .expect("options must parse");

        assert_eq!(opts.max_retries, 5);
        assert_eq!(opts.retry_wait_min, Duration::from_millis(10));
        assert_eq!(opts.retry_wait_max, Duration::from_secs(2));
        assert_eq!(opts.proxy_url.as_deref(), Some("http://proxy.local:3128"));
        assert!(opts.insecure_skip_verify);
        assert_eq!(opts.headers.get("X-Team").map(String::as_str), Some("payments"));
        assert_eq!(opts.headers.get("X-Env").map(String::as_str), Some("prod"));
        assert_eq!(opts.timeout, Duration::from_secs(30));
    }

    #[test]
    fn from_lookup_rejects_inverted_backoff_bounds() {
        let err = ClientOptions::from_lookup(lookup(&[
            ("HTTP_CLIENT_RETRY_WAIT_MIN", "5s"),
            ("HTTP_CLIENT_RETRY_WAIT_MAX", "1s"),
        ]))
        .expect_err("min above max must fail");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn from_lookup_rejects_malformed_headers() {
        let err = ClientOptions::from_lookup(lookup(&[("HTTP_CLIENT_HEADERS", "no-colon")]))
            .expect_err("header without separator must fail");
        assert!(matches!(err, Error::Config(_)));
    }
}
