//! Server configuration.
//!
//! Read once at startup from the environment (a `.env` file is loaded by the
//! binary through `dotenvy`). CLI flags override these values.

use std::env;

/// Default listen address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default upload limit in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 20;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Build from `MAINLIST_HOST`, `MAINLIST_PORT` and `MAINLIST_MAX_UPLOAD_MB`.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("MAINLIST_HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);
        let port = lookup("MAINLIST_PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_upload_bytes = lookup("MAINLIST_MAX_UPLOAD_MB")
            .and_then(|m| m.trim().parse::<usize>().ok())
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(defaults.max_upload_bytes);

        Self {
            host,
            port,
            max_upload_bytes,
        }
    }

    /// Apply CLI overrides.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}
