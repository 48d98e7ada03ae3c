//! Credential and token service for authgate
//!
//! This module provides:
//! - Password hashing and verification
//! - Signed, time-limited token issuance and verification
//! - The credential service tying both to the credential store

pub mod jwt;
pub mod password;
pub mod service;

pub use jwt::{Claims, TokenIssuer, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
pub use password::{hash_password, verify_password, HashError};
pub use service::CredentialService;
