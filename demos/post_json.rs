use std::time::Duration;

use resilient_http::{decode_json, Client, ClientOptions, RequestBody};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct Order<'a> {
    sku: &'a str,
    quantity: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = ClientOptions::default()
        .with_retry(2, Duration::from_millis(200), Duration::from_secs(2))
        .with_header("X-Request-Source", "post-json-demo");
    let client = Client::with_tracing(options)?;

    let body = RequestBody::json(&Order {
        sku: "A-100",
        quantity: 3,
    })?;
    let response = client.post("https://httpbin.org/post", None, body).await?;
    let echoed: Value = decode_json(response).await?;

    println!("{}", serde_json::to_string_pretty(&echoed["json"])?);
    Ok(())
}
