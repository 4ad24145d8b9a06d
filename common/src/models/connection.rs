//! Connection configuration models.
//!
//! A connection is a named set of credentials identifying one backend
//! database. Configs are registered at startup from the connections file and
//! may be upserted at runtime; the ID is the identity.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Full connection configuration (stored in the registry).
///
/// `db_type` is kept as the raw configured string. Whether a backend is
/// actually supported is decided when a capability runs against it, so an
/// unknown type can be registered but fails with `UnsupportedDialect` on use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ConnectionConfig {
    /// Unique connection identifier.
    #[validate(length(min = 1, max = 128, message = "Connection ID must be 1-128 characters"))]
    pub id: String,
    /// Database type (postgres, mysql, sqlite).
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Database type is required"))]
    pub db_type: String,
    /// Database host (file path for sqlite).
    #[serde(default)]
    pub host: String,
    /// Database port (dialect default when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database username.
    #[serde(default)]
    pub user: String,
    /// Database password (never serialized).
    #[serde(default, skip_serializing)]
    pub password: String,
    /// Catalog (database) name on the server.
    #[serde(default)]
    pub name: String,
    /// Free-form description shown by `list_databases`.
    #[serde(default)]
    pub description: String,
}

/// Connection item for API responses (excludes credentials).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionItem {
    /// Unique connection identifier.
    pub id: String,
    /// Database type.
    #[serde(rename = "type")]
    pub db_type: String,
    /// Database host.
    pub host: String,
    /// Database port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Catalog name.
    pub name: String,
    /// Description.
    pub description: String,
}

impl From<ConnectionConfig> for ConnectionItem {
    fn from(config: ConnectionConfig) -> Self {
        Self {
            id: config.id,
            db_type: config.db_type,
            host: config.host,
            port: config.port,
            name: config.name,
            description: config.description,
        }
    }
}
