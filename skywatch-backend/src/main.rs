use skywatch_backend::config::BackendConfig;
use skywatch_backend::http;
use skywatch_backend::service::SkywatchService;

use anyhow::Result;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = BackendConfig::from_file(&config_path)?;

    // Initialize logging
    let _logging_guard = skywatch_backend::logging::init_logging(
        "logs",
        "skywatch-backend",
        &config.log_level,
    )?;

    tracing::info!("Skywatch Backend starting...");
    tracing::info!("Configuration loaded from {}", config_path);
    tracing::info!("Data directory: {:?}", config.data_dir);

    let service = Arc::new(SkywatchService::from_config(&config).await?);

    // Reference table must be settled before requests are served
    service.startup().await;

    let addr = config.server_address();
    tracing::info!("HTTP server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, http::router(service)).await?;

    Ok(())
}
