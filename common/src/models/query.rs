//! SQL execution result models.

use serde::{Deserialize, Serialize};

/// Rows returned by a query, decoded into JSON cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column information, in select-list order.
    pub columns: Vec<ColumnInfo>,

    /// Row data (each row is a vector of JSON values, one per column).
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Number of rows returned.
    #[serde(default)]
    pub row_count: usize,

    /// Query execution time in milliseconds.
    #[serde(default)]
    pub execution_time_ms: u64,
}

/// Column information in a query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Backend type name (e.g. `INT8`, `VARCHAR`).
    pub data_type: String,
}

impl QueryResult {
    /// Creates a result from columns and rows.
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            execution_time_ms: 0,
        }
    }

    /// Sets the execution time.
    pub fn with_elapsed(mut self, execution_time_ms: u64) -> Self {
        self.execution_time_ms = execution_time_ms;
        self
    }
}
