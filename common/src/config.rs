//! Service configuration.
//!
//! Settings come from environment variables (optionally seeded from a `.env`
//! file); connection definitions come from a JSON connections file.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::connection::ConnectionConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration shared by the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name used in logs and response metadata.
    pub service_name: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Timeout for establishing a backend pool connection.
    pub connect_timeout_secs: u64,
    /// Maximum connections per backend pool.
    pub max_connections: u32,
    /// Upper bound for a single statement execution.
    pub query_timeout_secs: u64,
    /// Upper bound for a whole capability call.
    pub request_timeout_secs: u64,
    /// Path of the JSON connections file, if any.
    pub connections_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "capability-service".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: 10,
            max_connections: 5,
            query_timeout_secs: 30,
            request_timeout_secs: 120,
            connections_file: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the environment for the named service.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn load_with_service(service_name: &str) -> Self {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            host: std::env::var("SERVER_HOST").unwrap_or(defaults.host),
            port: env_or("SERVER_PORT", defaults.port),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            query_timeout_secs: env_or("QUERY_TIMEOUT_SECS", defaults.query_timeout_secs),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            connections_file: std::env::var("DB_CONFIG_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// On-disk connections file.
#[derive(Debug, Deserialize)]
pub struct ConnectionsFile {
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

impl ConnectionsFile {
    /// Parses and validates a connections document.
    pub fn from_json_str(content: &str) -> AppResult<Self> {
        let file: ConnectionsFile = serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("invalid connections file: {}", e)))?;
        for config in &file.connections {
            config.validate().map_err(|e| {
                AppError::Config(format!("invalid connection '{}': {}", config.id, e))
            })?;
        }
        Ok(file)
    }

    /// Reads a connections file from disk.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }
}

/// Loads a `.env` file from the working directory (best-effort, no error if missing).
///
/// Variables already present in the environment are left untouched.
pub fn load_dotenv() {
    let Ok(content) = std::fs::read_to_string(".env") else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}
