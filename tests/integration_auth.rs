//! Credential service integration tests
//!
//! Tests the credential service over HTTP including:
//! - Registration and duplicate handling
//! - Login and token issuance
//! - Identity listing

mod common;

use authgate::auth::{CredentialService, TokenIssuer};
use authgate::database::SqliteCredentialStore;
use authgate::server::AuthState;
use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

async fn register(
    client: &reqwest::Client,
    base: &str,
    username: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/register", base))
        .json(&json!({"username": username, "password": password}))
        .send()
        .await
        .unwrap()
}

async fn login(
    client: &reqwest::Client,
    base: &str,
    username: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/login", base))
        .json(&json!({"username": username, "password": password}))
        .send()
        .await
        .unwrap()
}

/// Test 1: Register then login yields a token for the registered subject
#[tokio::test]
async fn test_register_then_login() {
    let (addr, _shutdown) = run_auth_server(create_auth_state().await).await;
    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();

    let response = register(&client, &base, "alice", "pw").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    let response = login(&client, &base, "alice", "pw").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let claims = TokenIssuer::new(TEST_SECRET, 300).verify(token).unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.exp - claims.iat, 300);
}

/// Test 2: Registering the same username twice is a conflict
#[tokio::test]
async fn test_duplicate_registration() {
    let (addr, _shutdown) = run_auth_server(create_auth_state().await).await;
    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();

    assert_eq!(register(&client, &base, "alice", "pw").await.status(), StatusCode::OK);
    assert_eq!(
        register(&client, &base, "alice", "other").await.status(),
        StatusCode::CONFLICT
    );

    // The original password still works
    assert_eq!(login(&client, &base, "alice", "pw").await.status(), StatusCode::OK);
    assert_eq!(
        login(&client, &base, "alice", "other").await.status(),
        StatusCode::UNAUTHORIZED
    );
}

/// Test 3: Unknown user and wrong password are indistinguishable
#[tokio::test]
async fn test_login_failures_identical() {
    let (addr, _shutdown) = run_auth_server(create_auth_state().await).await;
    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();

    register(&client, &base, "alice", "pw").await;

    let wrong = login(&client, &base, "alice", "nope").await;
    let unknown = login(&client, &base, "ghost", "nope").await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.text().await.unwrap(), unknown.text().await.unwrap());
}

/// Test 4: Listing returns identities in insertion order without hashes
#[tokio::test]
async fn test_list_users() {
    let (addr, _shutdown) = run_auth_server(create_auth_state().await).await;
    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();

    register(&client, &base, "alice", "pw1").await;
    register(&client, &base, "bob", "pw2").await;

    let response = client.get(format!("{}/users", base)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();

    assert!(!body.contains("argon2"));
    assert!(!body.contains("password"));

    let users: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["username"], "alice");
    assert_eq!(users[1]["username"], "bob");
    assert!(users[0]["id"].as_i64().unwrap() < users[1]["id"].as_i64().unwrap());
}

/// Test 5: Listing is idempotent and empty on a fresh store
#[tokio::test]
async fn test_list_users_idempotent() {
    let (addr, _shutdown) = run_auth_server(create_auth_state().await).await;
    let url = format!("http://{}/users", addr);
    let client = reqwest::Client::new();

    let first: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    let second: Value = client.get(&url).send().await.unwrap().json().await.unwrap();

    assert_eq!(first, json!([]));
    assert_eq!(first, second);
}

/// Test 6: Missing fields and malformed bodies are bad requests
#[tokio::test]
async fn test_invalid_requests() {
    let (addr, _shutdown) = run_auth_server(create_auth_state().await).await;
    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/register", base))
        .json(&json!({"username": "alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/login", base))
        .header("content-type", "application/json")
        .body("{broken")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(
        register(&client, &base, "", "pw").await.status(),
        StatusCode::BAD_REQUEST
    );
}

/// Test 7: Identities persist across service restarts on a file store
#[tokio::test]
async fn test_identities_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.db");
    let path = path.to_str().unwrap();
    let client = reqwest::Client::new();

    {
        let store = Arc::new(SqliteCredentialStore::new(path).await.unwrap());
        let service = CredentialService::new(store, create_test_issuer());
        let (addr, shutdown) = run_auth_server(AuthState::new(Arc::new(service))).await;
        let base = format!("http://{}", addr);
        assert_eq!(register(&client, &base, "alice", "pw").await.status(), StatusCode::OK);
        let _ = shutdown.send(());
    }

    let store = Arc::new(SqliteCredentialStore::new(path).await.unwrap());
    let service = CredentialService::new(store, create_test_issuer());
    let (addr, _shutdown) = run_auth_server(AuthState::new(Arc::new(service))).await;
    let base = format!("http://{}", addr);

    assert_eq!(login(&client, &base, "alice", "pw").await.status(), StatusCode::OK);
}

/// Test 8: Health endpoint
#[tokio::test]
async fn test_health() {
    let (addr, _shutdown) = run_auth_server(create_auth_state().await).await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}
