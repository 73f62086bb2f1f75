use anyhow::Context;
use attribute_store::actors::{AttributeStoreActor, AttributeStoreArguments};
use attribute_store::api;
use attribute_store::config::{self, StoreConfig};
use attribute_store::env;
use axum::http::{header, HeaderValue, Method};
use ractor::Actor;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    env::load_dotenv();
    let config = StoreConfig::from_env()?;

    tracing::info!("Starting attribute store");

    let args = match &config.seed_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading seed items");
            AttributeStoreArguments::Seeded(config::load_seed(path)?)
        }
        None => AttributeStoreArguments::Empty,
    };

    let (store, _handle) = Actor::spawn(Some("attribute_store".to_string()), AttributeStoreActor, args)
        .await
        .context("Failed to spawn AttributeStoreActor")?;

    let allowed_origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    let app = api::router()
        .with_state(api::ApiState { store })
        .layer(cors);

    let bind_addr = config.bind_addr();
    tracing::info!("Starting HTTP server on http://{bind_addr}");
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
