//! Configuration management for authgate
//!
//! This module handles loading, parsing, and validating application configuration
//! from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::auth::MAX_TOKEN_TTL_SECS;
use crate::retry::RetryManager;

/// Prefix for all environment variables read by [`Config::from_env`]
pub const ENV_PREFIX: &str = "AUTHGATE_";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Credential service configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Credential store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Gateway routing configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // First, expand environment variables in the YAML string
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))
    }

    /// Load configuration from environment variables with prefix AUTHGATE_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(host) = env_var("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = env_var("SERVER_PORT") {
            config.server.port = parse_number("SERVER_PORT", &port)?;
        }

        if let Some(secret) = env_var("AUTH_JWT_SECRET") {
            config.auth.jwt_secret = Some(secret);
        }
        if let Some(ttl) = env_var("AUTH_TOKEN_TTL_SECS") {
            config.auth.token_ttl_secs = parse_number("AUTH_TOKEN_TTL_SECS", &ttl)?;
        }

        if let Some(path) = env_var("DATABASE_PATH") {
            config.database.path = Some(path);
        }
        if let Some(size) = env_var("DATABASE_POOL_SIZE") {
            config.database.pool_size = parse_number("DATABASE_POOL_SIZE", &size)?;
        }
        if let Some(attempts) = env_var("DATABASE_CONNECT_ATTEMPTS") {
            config.database.connect_attempts = parse_number("DATABASE_CONNECT_ATTEMPTS", &attempts)?;
        }
        if let Some(delay) = env_var("DATABASE_CONNECT_DELAY_SECS") {
            config.database.connect_delay_secs = parse_number("DATABASE_CONNECT_DELAY_SECS", &delay)?;
        }
        if let Some(timeout) = env_var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            config.database.acquire_timeout_secs =
                parse_number("DATABASE_ACQUIRE_TIMEOUT_SECS", &timeout)?;
        }

        if let Some(routes) = env_var("GATEWAY_ROUTES") {
            config.gateway.routes = parse_routes(&routes)?;
        }
        if let Some(timeout) = env_var("GATEWAY_REQUEST_TIMEOUT_SECS") {
            config.gateway.request_timeout_secs =
                parse_number("GATEWAY_REQUEST_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(limit) = env_var("GATEWAY_MAX_BODY_BYTES") {
            config.gateway.max_body_bytes = parse_number("GATEWAY_MAX_BODY_BYTES", &limit)?;
        }

        if let Some(level) = env_var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Check the values the credential service cannot start without
    ///
    /// Absence is a startup failure, never a per-request error.
    pub fn validate_auth(&self) -> Result<(), ConfigError> {
        match &self.database.path {
            Some(path) if !path.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingRequired("database.path".to_string())),
        }
        match &self.auth.jwt_secret {
            Some(secret) if !secret.is_empty() => {}
            _ => return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string())),
        }
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.auth.token_ttl_secs) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.token_ttl_secs must be between 1 and {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "database.pool_size must be at least 1".to_string(),
            ));
        }
        if self.database.connect_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "database.connect_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the gateway route table
    pub fn validate_gateway(&self) -> Result<(), ConfigError> {
        for route in &self.gateway.routes {
            if !route.prefix.starts_with('/') || route.prefix.len() < 2 {
                return Err(ConfigError::InvalidValue(format!(
                    "route prefix must start with '/' and be non-root: {}",
                    route.prefix
                )));
            }
            if route.prefix.ends_with('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "route prefix must not end with '/': {}",
                    route.prefix
                )));
            }
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name)).ok()
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Parse(format!("Invalid value for {}{}", ENV_PREFIX, name)))
}

/// Parse a route list of the form `/auth=http://auth:8001,/todos=http://todo:8002`
fn parse_routes(input: &str) -> Result<Vec<RouteConfig>, ConfigError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (prefix, upstream) = entry.split_once('=').ok_or_else(|| {
                ConfigError::Parse(format!("Invalid route entry (expected prefix=url): {}", entry))
            })?;
            Ok(RouteConfig::new(prefix.trim(), upstream.trim()))
        })
        .collect()
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Credential service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Symmetric key used to sign issued tokens
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: default_token_ttl(),
        }
    }
}

fn default_token_ttl() -> u64 {
    300
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, required by the credential service
    #[serde(default)]
    pub path: Option<String>,

    /// Number of pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection attempts per pooled connection before giving up
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,

    /// Fixed delay between connection attempts in seconds
    #[serde(default = "default_connect_delay")]
    pub connect_delay_secs: u64,

    /// Maximum wait for a free pooled connection in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: default_pool_size(),
            connect_attempts: default_connect_attempts(),
            connect_delay_secs: default_connect_delay(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Retry policy for establishing pooled connections
    ///
    /// `connect_attempts` tries in total, `connect_delay_secs` apart.
    pub fn connect_retry(&self) -> RetryManager {
        RetryManager::new(
            self.connect_attempts,
            Duration::from_secs(self.connect_delay_secs),
        )
    }
}

fn default_pool_size() -> usize {
    4
}

fn default_connect_attempts() -> u32 {
    5
}

fn default_connect_delay() -> u64 {
    2
}

fn default_acquire_timeout() -> u64 {
    5
}

/// A single gateway route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteConfig {
    /// Inbound path prefix, e.g. `/auth`
    pub prefix: String,

    /// Base URL of the backend, e.g. `http://auth:8001`
    pub upstream: String,
}

impl RouteConfig {
    pub fn new(prefix: impl Into<String>, upstream: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            upstream: upstream.into(),
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// Static route table
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    /// Timeout for a single upstream roundtrip in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum inbound request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            routes: default_routes(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/auth", "http://auth:8001"),
        RouteConfig::new("/todos", "http://todo:8002"),
    ]
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (`json` or `pretty`)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax
fn expand_env_vars(input: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .expect("Invalid regex pattern for environment variable expansion");

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
