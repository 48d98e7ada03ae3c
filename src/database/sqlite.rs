//! SQLite implementation of the CredentialStore trait
//!
//! This module provides a SQLite-based credential store using rusqlite and
//! tokio-rusqlite, with every operation running on a pooled connection.

use std::time::Duration;

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use tracing::info;

use super::migrations::CREATE_SCHEMA;
use super::pool::ConnectionPool;
use super::CredentialStore;
use crate::config::DatabaseConfig;
use crate::error::DbError;
use crate::models::{Identity, IdentityId, IdentitySummary};

/// SQLite credential store
pub struct SqliteCredentialStore {
    pool: ConnectionPool,
}

impl SqliteCredentialStore {
    /// Connect using the given configuration
    ///
    /// Every pooled connection is retried with the configured fixed delay.
    /// The schema is applied once the pool is up.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let path = config
            .path
            .as_deref()
            .ok_or_else(|| DbError::Connection("database path is not configured".to_string()))?;
        let pool = ConnectionPool::establish(
            path,
            config.pool_size,
            &config.connect_retry(),
            Duration::from_secs(config.acquire_timeout_secs),
        )
        .await?;

        let store = Self { pool };
        store.migrate().await?;

        info!(path, pool_size = config.pool_size, "Credential store ready");
        Ok(store)
    }

    /// Open a single-connection store without retry
    ///
    /// Use `:memory:` for an in-memory database or a file path for persistent storage.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        Self::connect(&DatabaseConfig {
            path: Some(path.to_string()),
            pool_size: 1,
            connect_attempts: 1,
            connect_delay_secs: 0,
            ..Default::default()
        })
        .await
    }

    /// Create a new in-memory store (useful for testing)
    ///
    /// Each SQLite in-memory connection is its own database, so this store
    /// always has exactly one connection.
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::new(":memory:").await
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), DbError> {
        let conn = self.pool.acquire().await?;
        conn.call(|conn| conn.execute_batch(CREATE_SCHEMA))
            .await
            .map_err(|e| DbError::Migration(e.to_string()))
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn insert_identity(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<IdentityId, DbError> {
        let username = username.to_string();
        let password_hash = password_hash.to_string();

        let conn = self.pool.acquire().await?;
        conn.call(move |conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                rusqlite::params![username, password_hash],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(Into::into)
    }

    async fn fetch_by_name(&self, username: &str) -> Result<Option<Identity>, DbError> {
        let username = username.to_string();

        let conn = self.pool.acquire().await?;
        conn.call(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, username, password_hash
                FROM users
                WHERE username = ?1
                "#,
            )?;

            let identity = stmt
                .query_row([&username], |row| {
                    Ok(Identity {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                })
                .optional()?;

            Ok(identity)
        })
        .await
        .map_err(Into::into)
    }

    async fn list_identities(&self) -> Result<Vec<IdentitySummary>, DbError> {
        let conn = self.pool.acquire().await?;
        conn.call(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, username
                FROM users
                ORDER BY id
                "#,
            )?;

            let identities = stmt
                .query_map([], |row| {
                    Ok(IdentitySummary {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(identities)
        })
        .await
        .map_err(Into::into)
    }
}
