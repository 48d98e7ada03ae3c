//! Identity-related domain models
//!
//! This module defines the stored identity record, the public identity summary,
//! and the request/response bodies of the credential service.

use serde::{Deserialize, Serialize};

/// Store-assigned identity identifier
pub type IdentityId = i64;

/// Identity record as stored
///
/// The secret hash never leaves the service; `Debug` redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Store-assigned identifier
    pub id: IdentityId,

    /// Unique display name
    pub username: String,

    /// Argon2id hash in PHC string format
    pub password_hash: String,
}

impl Identity {
    pub fn new(id: IdentityId, username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Identity as returned by listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: IdentityId,
    pub username: String,
}

impl IdentitySummary {
    pub fn new(id: IdentityId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Body of `POST /register` and `POST /login`
///
/// Missing fields deserialize to empty strings so that validation, not the
/// JSON extractor, decides the response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
}

impl RegisterResponse {
    pub fn registered() -> Self {
        Self {
            message: "User registered successfully".to_string(),
        }
    }
}

/// Response of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Compact-serialized signed token
    pub token: String,
}
