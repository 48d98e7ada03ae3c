//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use authgate::auth::{CredentialService, TokenIssuer};
use authgate::config::{GatewayConfig, RouteConfig};
use authgate::database::SqliteCredentialStore;
use authgate::gateway::{build_gateway_router, GatewayState};
use authgate::server::{build_auth_router, with_layers, AuthState};
use axum::Router;
use tokio::sync::oneshot;

/// Signing secret shared by test services
pub const TEST_SECRET: &[u8] = b"integration-test-secret";

/// Create an in-memory credential store for testing
pub async fn create_test_store() -> Arc<SqliteCredentialStore> {
    Arc::new(
        SqliteCredentialStore::in_memory()
            .await
            .expect("Failed to create test store"),
    )
}

/// Create a token issuer with the shared test secret
pub fn create_test_issuer() -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(TEST_SECRET, 300))
}

/// Create credential service state backed by an in-memory store
pub async fn create_auth_state() -> AuthState<SqliteCredentialStore> {
    let service = CredentialService::new(create_test_store().await, create_test_issuer());
    AuthState::new(Arc::new(service))
}

/// Create gateway state for the given routes
pub fn create_gateway_state(routes: Vec<RouteConfig>) -> GatewayState {
    create_gateway_state_with_timeout(routes, 5)
}

/// Create gateway state whose upstream requests time out after `timeout_secs`
pub fn create_gateway_state_with_timeout(
    routes: Vec<RouteConfig>,
    timeout_secs: u64,
) -> GatewayState {
    let config = GatewayConfig {
        routes,
        request_timeout_secs: timeout_secs,
        ..Default::default()
    };
    GatewayState::from_config(&config).expect("Failed to create gateway state")
}

/// Run the credential service in the background
pub async fn run_auth_server(
    state: AuthState<SqliteCredentialStore>,
) -> (SocketAddr, oneshot::Sender<()>) {
    run_test_server(build_auth_router(state)).await
}

/// Run the gateway in the background
pub async fn run_gateway_server(state: GatewayState) -> (SocketAddr, oneshot::Sender<()>) {
    run_test_server(build_gateway_router(state)).await
}

/// Run a test server in the background and return the address
/// The server will be shut down when the returned shutdown sender is dropped or sent
pub async fn run_test_server(router: Router) -> (SocketAddr, oneshot::Sender<()>) {
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local address");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let app = with_layers(router);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("Server error");
    });

    // Give the server a moment to start (100ms is sufficient for slow CI systems)
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    (addr, shutdown_tx)
}

/// Find a local port with nothing listening on it
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    port
}
