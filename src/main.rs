//! authgate - Credential service and path-prefix API gateway
//!
//! This is the main entry point. One binary runs either service.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;

use authgate::auth::{CredentialService, TokenIssuer};
use authgate::config::Config;
use authgate::database::SqliteCredentialStore;
use authgate::error::AppError;
use authgate::gateway::{build_gateway_router, GatewayState};
use authgate::logging::init_tracing;
use authgate::server::{build_auth_router, AuthState, Server};

/// authgate - Credential service and path-prefix API gateway
#[derive(Parser, Debug)]
#[command(name = "authgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "AUTHGATE_CONFIG", global = true)]
    config: Option<String>,

    /// Override the listen port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the credential service
    Auth,
    /// Run the gateway
    Gateway,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging.level, &config.logging.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = ?args.command,
        "Starting authgate"
    );

    let router = match args.command {
        Command::Auth => auth_router(&config)
            .await
            .context("Failed to start the credential service")?,
        Command::Gateway => gateway_router(&config).context("Failed to start the gateway")?,
    };

    let server = Server::new(config.server.clone(), router);

    info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting HTTP server"
    );

    server.run(shutdown_signal()).await?;

    info!("authgate shutdown complete");
    Ok(())
}

/// Connect the credential store and build the credential service router
///
/// A store that stays unreachable after all connection attempts is fatal.
async fn auth_router(config: &Config) -> Result<axum::Router, AppError> {
    config
        .validate_auth()
        .map_err(|e| AppError::Config(e.to_string()))?;

    let store = SqliteCredentialStore::connect(&config.database).await?;

    // validate_auth guarantees the secret is present
    let secret = config.auth.jwt_secret.as_deref().unwrap_or_default();
    let issuer = Arc::new(TokenIssuer::new(secret.as_bytes(), config.auth.token_ttl_secs));
    let service = Arc::new(CredentialService::new(Arc::new(store), issuer));

    Ok(build_auth_router(AuthState::new(service)))
}

/// Build the gateway router from the configured route table
fn gateway_router(config: &Config) -> Result<axum::Router, AppError> {
    config
        .validate_gateway()
        .map_err(|e| AppError::Config(e.to_string()))?;

    let state = GatewayState::from_config(&config.gateway)?;
    for route in state.routes.routes() {
        info!(prefix = route.prefix(), upstream = route.upstream(), "Route registered");
    }

    Ok(build_gateway_router(state))
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}

/// Create a future that resolves when a shutdown signal is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
