use std::sync::Arc;

use axum::Router;
use journal_sync::{api, clock::Clock, config::Config, services::SyncStore, AppState};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_sync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());
    info!("Starting journal-sync server on {}:{}", config.host, config.port);

    let store = Arc::new(SyncStore::new(&config.db_path)?);
    info!("sync store initialized at {}", config.db_path);

    let state = AppState {
        store,
        clock: Arc::new(Clock::new()),
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("journal-sync server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
