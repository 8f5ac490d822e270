mod cleanup;
mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use proverbs_api::{AppState, AppStateInner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "proverbs=debug,proverbs_api=debug,proverbs_db=debug,tower_http=debug".into()
                }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = proverbs_db::Database::open(&config.db_path)?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        default_version: config.default_version.clone(),
    });

    tokio::spawn(cleanup::run_cleanup_loop(
        app_state.clone(),
        config.cleanup_interval_secs,
    ));

    let app = proverbs_api::router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Proverbs server listening on {}", addr);
    info!("New profiles default to '{}'", config.default_version);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
