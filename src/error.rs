//! Application error types for authgate
//!
//! This module defines the error taxonomy shared by the credential service,
//! the credential store and the gateway dispatcher.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Credential service errors
///
/// These are the errors callers of the credential service see. Store details
/// are carried for logging only and never rendered into a response body.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Missing or malformed request fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown identity or wrong secret. Deliberately carries no detail.
    #[error("Invalid credentials")]
    Unauthorized,

    /// Registration conflict on the display name
    #[error("Identity already exists")]
    DuplicateIdentity,

    /// Could not obtain a store connection
    #[error("Store connection error: {0}")]
    Connection(String),

    /// Store failure other than connectivity
    #[error("Store error: {0}")]
    Store(String),

    /// Token signing failed
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Secret hashing failed
    #[error("Hash error: {0}")]
    Hash(String),
}

impl From<DbError> for CredentialError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConstraintViolation(_) => CredentialError::DuplicateIdentity,
            DbError::Connection(msg) | DbError::PoolTimeout(msg) => {
                CredentialError::Connection(msg)
            }
            other => CredentialError::Store(other.to_string()),
        }
    }
}

/// Token signing and verification errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenError {
    /// Token is past its expiration instant
    #[error("Token expired")]
    Expired,

    /// Signature, structure or claims are invalid
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Signing failed
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::Invalid("bad signature".into()),
            ErrorKind::InvalidToken => TokenError::Invalid("malformed token".into()),
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Connection could not be opened or failed its liveness probe
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timed out waiting for a pooled connection
    #[error("Timed out acquiring connection: {0}")]
    PoolTimeout(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, msg) = &err {
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                return DbError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| "unique constraint".to_string()),
                );
            }
        }
        DbError::Sqlite(err)
    }
}

/// Gateway dispatch errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The outbound request could not be built (surfaced as 500)
    #[error("Failed to build upstream request: {0}")]
    RequestConstruction(String),

    /// The upstream connection or roundtrip failed (surfaced as 502)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Application-level error type
///
/// Aggregates the domain-specific errors for process-level reporting.
#[derive(Debug, Error)]
pub enum AppError {
    /// Credential service error
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Gateway error
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Trait for determining if an error is retryable
pub trait RetryableError {
    /// Returns true if the error is retryable
    fn is_retryable(&self) -> bool;
}

impl RetryableError for DbError {
    fn is_retryable(&self) -> bool {
        // Only establishing a connection is retried; query failures are not.
        matches!(self, DbError::Connection(_))
    }
}
