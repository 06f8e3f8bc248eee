//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

const DEFAULT_CATALOG_URL: &str = "https://www.googleapis.com/books/v1";
/// Longest accepted login session, in days.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Sent as the `key` query parameter when non-empty.
    pub google_books_api_key: String,
    pub google_books_base_url: String,
    pub catalog_timeout: Duration,
    pub cors_origin: String,
    pub session_ttl_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Catalog Settings ---
        let google_books_api_key = lookup("GOOGLE_BOOKS_API_KEY").unwrap_or_default();
        let google_books_base_url = lookup("GOOGLE_BOOKS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let catalog_timeout = Duration::from_secs(parse_number(&lookup, "CATALOG_TIMEOUT_SECS", 10)?);

        // --- Load Web Settings ---
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let session_ttl_days = parse_number(&lookup, "SESSION_TTL_DAYS", 30)?;
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&session_ttl_days) {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                format!("must be between 1 and {}", MAX_SESSION_TTL_DAYS),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            google_books_api_key,
            google_books_base_url,
            catalog_timeout,
            cors_origin,
            session_ttl_days,
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
