//! Domain models for authgate
//!
//! This module contains the core domain models used throughout the application.

pub mod identity;

// Re-export commonly used types
pub use identity::{
    Credentials, Identity, IdentityId, IdentitySummary, LoginResponse, RegisterResponse,
};
