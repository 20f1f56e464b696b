//! QRIS Storefront - Self-hosted Digital Goods Storefront

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qris_storefront::config::Config;
use qris_storefront::notify::Notifier;
use qris_storefront::routes;
use qris_storefront::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let notifier = Notifier::new(http.clone(), config.bot_base_url.clone(), config.bot_token.clone());

    let port = config.port;
    let state = AppState {
        db,
        config: Arc::new(config),
        http,
        notifier,
        started_at: Instant::now(),
    };
    let app = routes::init_router(state);

    tracing::info!("🚀 QRIS Storefront listening on 0.0.0.0:{}", port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?,
        app,
    )
    .await?;
    Ok(())
}
