//! Path-prefix API gateway
//!
//! This module provides:
//! - The static prefix route table
//! - The dispatcher that forwards matched requests to a backend
//! - The default responder for unmatched paths

pub mod proxy;
pub mod routes;

pub use proxy::{default_response, dispatch, DEFAULT_RESPONSE_BODY};
pub use routes::{Route, RouteTable};

use std::sync::Arc;
use std::time::Duration;

use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::server::HealthResponse;

/// Shared state for the gateway
#[derive(Clone)]
pub struct GatewayState {
    /// Route table, read-only after startup
    pub routes: Arc<RouteTable>,
    /// Pooled HTTP client used for every backend
    pub client: reqwest::Client,
    /// Maximum inbound request body size
    pub max_body_bytes: usize,
}

impl GatewayState {
    /// Build gateway state from configuration
    ///
    /// Redirects are never followed: a backend's 3xx is relayed as is.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| GatewayError::RequestConstruction(e.to_string()))?;

        Ok(Self {
            routes: Arc::new(RouteTable::from_config(&config.routes)),
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

/// Build the gateway router
///
/// `/health` is answered locally; everything else goes through [`dispatch`].
pub fn build_gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(dispatch)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::healthy("gateway"))
}
