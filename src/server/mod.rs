//! HTTP server components for authgate
//!
//! This module provides the HTTP server infrastructure including:
//! - The credential service router and its handlers
//! - Logging and tracing middleware
//! - Server lifecycle management shared by both services

pub mod middleware;
pub mod router;

pub use middleware::{logging_middleware, tracing_middleware};
pub use router::{build_auth_router, AuthState, ErrorResponse, HealthResponse};

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServerConfig;

/// HTTP Server for authgate
///
/// Runs either the credential service or the gateway router:
/// - Binding to configured address
/// - Applying middleware layers
/// - Graceful shutdown handling
pub struct Server {
    config: ServerConfig,
    router: Router,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self { config, router }
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.config.host.parse().unwrap_or([0, 0, 0, 0].into()),
            self.config.port,
        )
    }

    /// Run the server until shutdown signal is received
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Future that resolves when the server should shut down
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = self.bind_addr();
        let app = with_layers(self.router);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Apply the middleware stack shared by both services
pub fn with_layers(router: Router) -> Router {
    router
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(axum::middleware::from_fn(tracing_middleware))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("Failed to bind to address: {0}")]
    Bind(String),

    /// Failed to serve requests
    #[error("Server error: {0}")]
    Serve(String),
}
