use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Decodes a 2xx JSON response body into `T`.
///
/// The response is consumed, so the connection is released on every path.
/// Non-2xx responses fail with [`Error::HttpStatus`] without reading the body.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            code: status.as_u16(),
            status: status.to_string(),
        });
    }

    let bytes = response.bytes().await.map_err(Error::Io)?;
    serde_json::from_slice(&bytes).map_err(Error::Decode)
}

/// Drains the body into memory regardless of status.
pub async fn read_body(response: Response) -> Result<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(Error::Io)
}

/// Drains the body as text. Invalid UTF-8 is replaced rather than rejected.
pub async fn read_body_text(response: Response) -> Result<String> {
    let bytes = read_body(response).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
