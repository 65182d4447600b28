use std::{fs, path::Path, time::Duration};

use reqwest::{tls, Identity, Proxy, Url};

use crate::{redirect::RedirectPolicy, ClientOptions, Error, Result};

/// TCP keep-alive probe interval for pooled connections.
pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Builds the pooled `reqwest` transport described by `options`.
///
/// Reads the client certificate files when both paths are set; performs no
/// network I/O.
pub(crate) fn build_transport(
    options: &ClientOptions,
    redirect: RedirectPolicy,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(options.timeout)
        .connect_timeout(
            options
                .dial_timeout
                .saturating_add(options.tls_handshake_timeout),
        )
        .tcp_keepalive(TCP_KEEPALIVE)
        .pool_max_idle_per_host(options.max_idle_conns_per_host)
        .pool_idle_timeout(options.idle_conn_timeout)
        .min_tls_version(tls::Version::TLS_1_2)
        .danger_accept_invalid_certs(options.insecure_skip_verify)
        .redirect(redirect.into_reqwest());

    if let (Some(cert), Some(key)) = (&options.cert_file, &options.key_file) {
        builder = builder.identity(load_identity(cert, key)?);
    }

    if let Some(proxy_url) = options.proxy_url.as_deref().filter(|url| !url.is_empty()) {
        builder = builder.proxy(parse_proxy(proxy_url)?);
    }

    builder
        .build()
        .map_err(|err| Error::Config(format!("failed to build http transport: {err}")))
}

fn load_identity(cert: &Path, key: &Path) -> Result<Identity> {
    let read = |path: &Path| {
        fs::read(path).map_err(|err| {
            Error::Certificate(format!("failed to read {}: {err}", path.display()))
        })
    };

    let mut pem = read(cert)?;
    pem.push(b'\n');
    pem.extend_from_slice(&read(key)?);

    Identity::from_pem(&pem)
        .map_err(|err| Error::Certificate(format!("failed to load client certificate: {err}")))
}

fn parse_proxy(proxy_url: &str) -> Result<Proxy> {
    let url = Url::parse(proxy_url)
        .map_err(|err| Error::Config(format!("invalid proxy url '{proxy_url}': {err}")))?;
    if url.host_str().is_none() {
        return Err(Error::Config(format!(
            "invalid proxy url '{proxy_url}': missing host"
        )));
    }
    Proxy::all(url).map_err(|err| Error::Config(format!("failed to configure proxy: {err}")))
}
