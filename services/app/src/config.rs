//! services/app/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. The resolved base URL is the only place
//! the backend address is configured.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Port the development backend listens on when discovered by host name.
pub const DEV_BACKEND_PORT: u16 = 5246;
pub const FALLBACK_BASE_URL: &str = "http://localhost:5246/api";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub log_level: Level,
    pub session_path: PathBuf,
    pub request_timeout: Duration,
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

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend address ---
        let base_url = resolve_base_url(
            lookup("API_BASE_URL").as_deref(),
            lookup("DEV_SERVER_HOST").as_deref(),
        )?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let session_path = lookup("SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/session.json"));

        let timeout_str = lookup("REQUEST_TIMEOUT_SECS").unwrap_or_else(|| "30".to_string());
        let timeout_secs = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "REQUEST_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        Ok(Self {
            base_url,
            log_level,
            session_path,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Explicit URL first, then the discovered dev host, then the local fallback.
fn resolve_base_url(explicit: Option<&str>, dev_host: Option<&str>) -> Result<String, ConfigError> {
    if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "API_BASE_URL".to_string(),
                format!("'{}' must start with http:// or https://", url),
            ));
        }
        return Ok(url.trim_end_matches('/').to_string());
    }

    // The dev host may carry the bundler's port; only the address is kept.
    if let Some(host) = dev_host
        .and_then(|h| h.split(':').next())
        .map(str::trim)
        .filter(|h| !h.is_empty())
    {
        return Ok(format!("http://{}:{}/api", host, DEV_BACKEND_PORT));
    }

    Ok(FALLBACK_BASE_URL.to_string())
}
