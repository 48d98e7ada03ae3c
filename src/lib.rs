//! authgate - Credential service and path-prefix API gateway
//!
//! This crate provides two HTTP services sharing one code base: a credential
//! service that registers identities and issues signed, time-limited tokens,
//! and a gateway that forwards requests to backends by path prefix.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod retry;
pub mod server;
