//! Application state for the capability service.

use std::sync::Arc;

use common::config::{AppConfig, ConnectionsFile};
use common::errors::AppResult;

use crate::dispatcher::CapabilityDispatcher;
use crate::pool_manager::PoolManager;
use crate::registry::ConnectionRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<ConnectionRegistry>,
    pub pool_manager: Arc<PoolManager>,
    pub dispatcher: CapabilityDispatcher,
}

impl AppState {
    /// Creates the state, registering every entry of the configured
    /// connections file.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let connections = match &config.connections_file {
            Some(path) => ConnectionsFile::load(path)?.connections,
            None => {
                tracing::warn!("DB_CONFIG_FILE not set, starting with no connections");
                Vec::new()
            }
        };
        tracing::info!(count = connections.len(), "connections loaded");

        let registry = Arc::new(ConnectionRegistry::with_configs(connections));
        Ok(Self::with_registry(config, registry))
    }

    /// Creates the state around an existing registry.
    pub fn with_registry(config: AppConfig, registry: Arc<ConnectionRegistry>) -> Self {
        let pool_manager = Arc::new(PoolManager::new(config.clone(), registry.clone()));
        let dispatcher = CapabilityDispatcher::new(pool_manager.clone());
        Self {
            config,
            registry,
            pool_manager,
            dispatcher,
        }
    }
}
