//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// PDV server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdvConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Maximum database pool connections
    pub db_max_connections: u32,
}

impl PdvConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = PdvConfig {
            http_port: env::var("PDV_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PDV_PORT".to_string()))?,

            database_path: env::var("PDV_DATABASE_PATH")
                .unwrap_or_else(|_| "./data/pdv.db".to_string()),

            db_max_connections: env::var("PDV_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PDV_DB_MAX_CONNECTIONS".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Defaults apply when the variables are unset
        let config = PdvConfig::load().unwrap();
        assert!(config.http_port > 0);
        assert!(!config.database_path.is_empty());
    }
}
