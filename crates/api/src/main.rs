use std::path::PathBuf;
use std::sync::Arc;

use partscope_api::app::{self, ServicesConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    partscope_observability::init();

    let config = ServicesConfig {
        model_path: env_path("PARTSCOPE_MODEL_PATH", "model.pt"),
        data_dir: env_path("PARTSCOPE_DATA_DIR", "inventory"),
        database: std::env::var("PARTSCOPE_DATABASE").ok().map(PathBuf::from),
    };
    if config.database.is_none() {
        tracing::warn!("PARTSCOPE_DATABASE not set; inventory is kept in memory only");
    }

    // A missing model checkpoint fails here: no partial-service mode.
    let services = Arc::new(app::build_services(&config).await?);
    let router = app::build_app(services);

    let addr = std::env::var("PARTSCOPE_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
