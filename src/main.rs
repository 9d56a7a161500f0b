// ABOUTME: Main entry point for the connection manager server
// ABOUTME: Loads configuration, migrates and seeds the store, then serves the REST API

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use connection_manager::{
    AppState, bootstrap, config::Config, crypto::CredentialCodec, routes, storage::Storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::parse();
    config.verify()?;

    let codec = CredentialCodec::new(&config.credential_secret)?;
    let storage = Arc::new(Storage::connect(&config.database_url, codec).await?);
    info!("Database ready at {}", config.database_url);

    let (admin_password, generated) = match &config.admin_password {
        Some(password) => (password.clone(), false),
        None => (bootstrap::generate_admin_password(), true),
    };
    if bootstrap::seed(&storage, &admin_password).await? && generated {
        warn!(
            "Generated password for '{}': {} (shown once, change it)",
            bootstrap::ADMIN_NAME,
            admin_password
        );
    }

    let app = routes::build_router(AppState { storage }, config.request_timeout());

    let listener = TcpListener::bind(config.listen).await?;
    info!("Connection manager listening on {}", config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
