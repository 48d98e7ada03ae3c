//! Credential store layer for authgate
//!
//! This module defines the credential store trait, its SQLite implementation,
//! and the connection pool behind it.

pub mod migrations;
pub mod pool;
pub mod sqlite;

pub use pool::{ConnectionPool, PooledConnection};
pub use sqlite::SqliteCredentialStore;

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{Identity, IdentityId, IdentitySummary};

/// Parameterized access to the identity table
///
/// It uses `async_trait` for async methods and `mockall::automock` for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new identity
    ///
    /// Returns the store-assigned id, or `DbError::ConstraintViolation` when
    /// the username is already taken. Nothing is written in that case.
    async fn insert_identity(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<IdentityId, DbError>;

    /// Fetch an identity by username
    ///
    /// Returns `None` when no such identity exists.
    async fn fetch_by_name(&self, username: &str) -> Result<Option<Identity>, DbError>;

    /// List all identities in insertion order
    async fn list_identities(&self) -> Result<Vec<IdentitySummary>, DbError>;
}
