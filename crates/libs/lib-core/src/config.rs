//! # Application Configuration
//!
//! Configuration loaded from environment variables and validated on startup
//! so a misconfigured gateway fails fast instead of forwarding into the void.

use crate::error::{AppError, Result};
use std::env;

/// Gateway configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the upstream backend that owns all business logic.
    ///
    /// Every `/api/*` proxy route forwards to this origin.
    pub backend_url: String,

    /// Base URL of the external price/agent service.
    pub price_api_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let backend_url = env::var("BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:3002".to_string());

        let price_api_url = env::var("PRICE_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        Ok(Self {
            backend_url,
            price_api_url,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        validate_origin("BACKEND_URL", &self.backend_url)?;
        validate_origin("PRICE_API_URL", &self.price_api_url)?;
        Ok(())
    }
}

fn validate_origin(name: &str, value: &str) -> Result<()> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(AppError::Config(format!(
            "{} must be an http(s) URL, got: {}",
            name, value
        )));
    }

    if value.ends_with('/') {
        return Err(AppError::Config(format!(
            "{} must not end with a trailing slash",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config {
            backend_url: "http://localhost:3002".to_string(),
            price_api_url: "http://localhost:8000".to_string(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_http_origin() {
        let config = Config {
            backend_url: "localhost:3002".to_string(),
            price_api_url: "http://localhost:8000".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn origin_failures_are_config_errors() {
        let config = Config {
            backend_url: "localhost:3002".to_string(),
            price_api_url: "http://localhost:8000".to_string(),
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_trailing_slash() {
        let config = Config {
            backend_url: "http://localhost:3002/".to_string(),
            price_api_url: "http://localhost:8000".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
