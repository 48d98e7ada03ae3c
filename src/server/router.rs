//! HTTP router for the credential service
//!
//! This module defines the axum router that exposes the credential service
//! as JSON over HTTP:
//! - `POST /register`
//! - `POST /login`
//! - `GET /users`
//! - `GET /health`

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::CredentialService;
use crate::database::CredentialStore;
use crate::error::CredentialError;
use crate::models::Credentials;

/// Shared application state for the credential service
pub struct AuthState<S: CredentialStore> {
    /// Credential service
    pub service: Arc<CredentialService<S>>,
}

impl<S: CredentialStore> AuthState<S> {
    pub fn new(service: Arc<CredentialService<S>>) -> Self {
        Self { service }
    }
}

impl<S: CredentialStore> Clone for AuthState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(service: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Build the credential service router
pub fn build_auth_router<S: CredentialStore + 'static>(state: AuthState<S>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/register", post(register_handler::<S>))
        .route("/login", post(login_handler::<S>))
        .route("/users", get(list_users_handler::<S>))
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::healthy("auth"))
}

async fn register_handler<S: CredentialStore + 'static>(
    State(state): State<AuthState<S>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(creds) = payload.map_err(ErrorResponse::from_rejection)?;

    let response = state
        .service
        .register(&creds.username, &creds.password)
        .await
        .map_err(ErrorResponse::from_error)?;

    Ok(Json(response).into_response())
}

async fn login_handler<S: CredentialStore + 'static>(
    State(state): State<AuthState<S>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let Json(creds) = payload.map_err(ErrorResponse::from_rejection)?;

    let response = state
        .service
        .login(&creds.username, &creds.password)
        .await
        .map_err(ErrorResponse::from_error)?;

    Ok(Json(response).into_response())
}

async fn list_users_handler<S: CredentialStore + 'static>(
    State(state): State<AuthState<S>>,
) -> Result<Response, ErrorResponse> {
    let identities = state
        .service
        .list_identities()
        .await
        .map_err(ErrorResponse::from_error)?;

    Ok(Json(identities).into_response())
}

// =============================================================================
// Error responses
// =============================================================================

/// Opaque error response
///
/// Internal details are logged where the error is raised and never rendered.
#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: &'static str,
}

impl ErrorResponse {
    pub fn from_error(error: CredentialError) -> Self {
        match error {
            CredentialError::InvalidInput(_) => Self {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid request",
            },
            CredentialError::Unauthorized => Self {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid credentials",
            },
            CredentialError::DuplicateIdentity => Self {
                status: StatusCode::CONFLICT,
                message: "User already exists",
            },
            CredentialError::Connection(_)
            | CredentialError::Store(_)
            | CredentialError::Token(_)
            | CredentialError::Hash(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Internal server error",
            },
        }
    }

    fn from_rejection(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Invalid request",
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
