//! Shelter Server: application entry point.

use shelter_auth::TokenKeys;
use shelter_db::DbManager;
use shelter_server::{App, AppConfig, AppError, LogEmailSender};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shelter=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Shelter server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let path = AppConfig::default_path();
    let config = AppConfig::load(&path)?;
    info!(config = %path.display(), "Starting shelter server...");

    let tokens = TokenKeys::from_config(&config.auth)
        .map_err(|e| AppError::Config(format!("auth keys: {e}")))?;
    if !tokens.can_issue() {
        info!("No signing key configured, tokens are verified only");
    }

    let db = DbManager::connect(&config.database).await?;
    db.migrate().await?;

    let sender = LogEmailSender::new(&config.email);
    let (_app, worker) = App::build(db.client().clone(), tokens, config.service, sender);

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down, flushing queued emails");
    worker.shutdown().await;

    info!("Shelter server stopped.");
    Ok(())
}
