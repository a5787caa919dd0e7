use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_api::api::router;
use todo_api::config::{AppConfig, DEFAULT_LOG_FILTER};
use todo_api::models::time;
use todo_api::services::{TaskService, seed};
use todo_api::state::AppState;
use todo_api::store::{SqliteTaskStore, TaskStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let store: Arc<dyn TaskStore> =
        Arc::new(SqliteTaskStore::connect(&config.database_url, config.max_connections).await?);

    if let Some(path) = &config.sample_data {
        let entries = seed::load_sample_data(path).await?;
        TaskService::new(store.clone()).seed(entries, time::now()).await?;
    }

    let app = router(AppState::new(store));

    let addr = config.bind_address();
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("terminating server");
    }
}
