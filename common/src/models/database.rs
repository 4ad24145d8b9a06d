//! Database listing models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placeholder used when a listing attribute cannot be resolved.
pub const UNKNOWN: &str = "Unknown";

/// One row of the `list_databases` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseItem {
    /// Connection ID.
    pub id: String,
    /// Database type (postgres, mysql, sqlite).
    #[serde(rename = "type")]
    pub db_type: String,
    /// Database host address.
    pub host: String,
    /// Database port number, as text.
    pub port: String,
    /// Catalog name.
    pub name: String,
    /// Description.
    pub description: String,
}

impl DatabaseItem {
    /// Row for a connection whose details could not be looked up.
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            db_type: UNKNOWN.to_string(),
            host: UNKNOWN.to_string(),
            port: UNKNOWN.to_string(),
            name: UNKNOWN.to_string(),
            description: UNKNOWN.to_string(),
        }
    }

    /// Builds a row from the loosely-typed info map returned by the executor.
    ///
    /// Missing or non-string attributes fall back to `Unknown`; a missing
    /// description renders empty.
    pub fn from_info(
        id: &str,
        db_type: Option<&str>,
        info: &serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let text = |key: &str| -> Option<String> {
            match info.get(key)? {
                serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        Self {
            id: id.to_string(),
            db_type: db_type
                .filter(|t| !t.is_empty())
                .map(String::from)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            host: text("host").unwrap_or_else(|| UNKNOWN.to_string()),
            port: text("port").unwrap_or_else(|| UNKNOWN.to_string()),
            name: text("database").unwrap_or_else(|| UNKNOWN.to_string()),
            description: text("description").unwrap_or_default(),
        }
    }
}
