//! Database migrations for authgate
//!
//! This module contains the SQL schema for the credential store.

/// SQL statement to create the initial database schema
pub const CREATE_SCHEMA: &str = r#"
-- Registered identities
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);
"#;
