use resilient_http::{Client, ClientOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://httpbin.org/status/200".to_owned());

    let client = Client::with_tracing(ClientOptions::from_env()?)?;
    client.health_check(&url).await?;
    tracing::info!(%url, "service healthy");

    client.close();
    Ok(())
}
