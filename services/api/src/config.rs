//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

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
    /// Postgres connection string. When unset the service falls back to the
    /// in-memory store (dev and test only; nothing survives a restart).
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Push gateway endpoint for match notifications. When unset, matches
    /// are only announced in-app.
    pub push_gateway_url: Option<String>,
    /// Default page size for `GET /cards` when the client sends no limit.
    pub default_card_limit: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL").ok();

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Notification Settings ---
        let push_gateway_url = std::env::var("PUSH_GATEWAY_URL").ok();

        // --- Load Queue Settings ---
        let default_card_limit = match std::env::var("DEFAULT_CARD_LIMIT") {
            Ok(raw) => raw.parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue(
                    "DEFAULT_CARD_LIMIT".to_string(),
                    format!("'{}' is not a valid page size", raw),
                )
            })?,
            Err(_) => 20,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            push_gateway_url,
            default_card_limit,
        })
    }
}
