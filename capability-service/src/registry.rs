//! Connection registry.
//!
//! Holds every known [`ConnectionConfig`] keyed by ID. Built once at startup
//! and shared by `Arc` with the executor and the handlers. Reads take a shared
//! lock; `register` takes the write lock only for the map insert, so a reader
//! sees either the old or the new config, never a partial one.

use std::collections::HashMap;

use common::errors::{AppError, AppResult};
use common::models::connection::ConnectionConfig;
use tokio::sync::RwLock;

/// Registry of named connection configurations.
#[derive(Default)]
pub struct ConnectionRegistry {
    configs: RwLock<HashMap<String, ConnectionConfig>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry pre-populated with `configs` (later duplicates win).
    pub fn with_configs(configs: impl IntoIterator<Item = ConnectionConfig>) -> Self {
        let map = configs
            .into_iter()
            .map(|config| (config.id.clone(), config))
            .collect();
        Self {
            configs: RwLock::new(map),
        }
    }

    /// Inserts or replaces the config stored under `config.id`.
    ///
    /// Returns the previous config, if any.
    pub async fn register(&self, config: ConnectionConfig) -> Option<ConnectionConfig> {
        let id = config.id.clone();
        let previous = self.configs.write().await.insert(id.clone(), config);
        if previous.is_some() {
            tracing::info!(id = %id, "connection re-registered");
        } else {
            tracing::info!(id = %id, "connection registered");
        }
        previous
    }

    /// Returns the config registered under `id`.
    pub async fn get(&self, id: &str) -> AppResult<ConnectionConfig> {
        self.configs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::ConnectionNotFound(id.to_string()))
    }

    /// Registered IDs in ascending order.
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.configs.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All configs, ordered by ID.
    pub async fn list(&self) -> Vec<ConnectionConfig> {
        let mut configs: Vec<ConnectionConfig> =
            self.configs.read().await.values().cloned().collect();
        configs.sort_by(|a, b| a.id.cmp(&b.id));
        configs
    }

    pub async fn len(&self) -> usize {
        self.configs.read().await.len()
    }
}
