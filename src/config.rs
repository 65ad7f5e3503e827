//! Server configuration module
//! Runtime parameters come from the environment, with compiled defaults.

use std::env;

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT};
use crate::error::{RelayError, Result};

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("SEALED_ROOMS_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match env::var("SEALED_ROOMS_PORT") {
            Ok(raw) => raw.parse().map_err(|_| {
                RelayError::ConfigError(format!("invalid SEALED_ROOMS_PORT value: {}", raw))
            })?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self { host, port })
    }
}
