//! Typed capability parameters.
//!
//! One struct per capability. Defaults follow the published parameter
//! schema; required fields have no serde default so a missing one fails
//! deserialization. Optional name filters treat an empty string as absent.

use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

fn default_true() -> bool {
    true
}

fn default_sample_limit() -> u32 {
    10
}

fn default_unique_limit() -> u32 {
    100
}

/// Accepts a row limit as a JSON integer or an integral float (`10.0`).
fn deserialize_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(de::Error::custom(format!(
            "limit must be a non-negative whole number, got {value}"
        )));
    }
    Ok(value as u32)
}

/// Returns the trimmed filter, or `None` when absent or blank.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parameters for `execute_sql`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ExecuteSqlParams {
    /// SQL query or statement to execute.
    #[validate(length(min = 1, message = "sql must not be empty"))]
    pub sql: String,
    /// Connection ID to execute the SQL on.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Positional parameters bound to the statement.
    #[serde(default)]
    pub params: Vec<String>,
    /// Forces query (`true`) or statement (`false`) routing; auto-detected when absent.
    #[serde(default, rename = "isQuery", skip_serializing_if = "Option::is_none")]
    pub is_query: Option<bool>,
}

/// Parameters for `get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DatabaseStatsParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Include buffer/cache and I/O statements.
    #[serde(default)]
    pub detailed: bool,
}

/// Parameters for `get_table_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct TableStatsParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Table to describe.
    #[validate(length(min = 1, message = "table must not be empty"))]
    pub table: String,
    /// Include I/O and bloat statements.
    #[serde(default)]
    pub detailed: bool,
}

/// Parameters for `get_indexes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct IndexesParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Restrict to one table.
    #[serde(default)]
    pub table: Option<String>,
    /// Richer projection (size, definition, partial, sort order).
    #[serde(default)]
    pub detailed: bool,
}

impl IndexesParams {
    pub fn table(&self) -> Option<&str> {
        non_blank(&self.table)
    }
}

/// Parameters for `get_constraints`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ConstraintsParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Restrict to one table.
    #[serde(default)]
    pub table: Option<String>,
    /// PRIMARY KEY, FOREIGN KEY, UNIQUE, CHECK or EXCLUSION.
    #[serde(default)]
    pub constraint_type: Option<String>,
}

impl ConstraintsParams {
    pub fn table(&self) -> Option<&str> {
        non_blank(&self.table)
    }

    pub fn constraint_type(&self) -> Option<&str> {
        non_blank(&self.constraint_type)
    }
}

/// Parameters for `get_views`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ViewsParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Restrict to one view.
    #[serde(default)]
    pub view: Option<String>,
    /// Project the view's SQL definition.
    #[serde(default = "default_true")]
    pub include_definition: bool,
}

impl ViewsParams {
    pub fn view(&self) -> Option<&str> {
        non_blank(&self.view)
    }
}

/// Parameters for `get_types`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct TypesParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Restrict to one type.
    #[serde(default)]
    pub type_name: Option<String>,
}

impl TypesParams {
    pub fn type_name(&self) -> Option<&str> {
        non_blank(&self.type_name)
    }
}

/// Parameters for `get_schemas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct SchemasParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Restrict to one schema.
    #[serde(default)]
    pub schema: Option<String>,
    /// Keep catalog schemas such as `pg_catalog` and `information_schema`.
    #[serde(default)]
    pub include_system_schemas: bool,
}

impl SchemasParams {
    pub fn schema(&self) -> Option<&str> {
        non_blank(&self.schema)
    }
}

/// Parameters for `get_sample_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct SampleDataParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Table to sample.
    #[validate(length(min = 1, message = "table must not be empty"))]
    pub table: String,
    /// Maximum number of rows.
    #[serde(default = "default_sample_limit", deserialize_with = "deserialize_limit")]
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: u32,
    /// Raw WHERE fragment (trusted caller).
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    /// Raw ORDER BY fragment (trusted caller).
    #[serde(default)]
    pub order_by: Option<String>,
    /// Order by the dialect's random function; wins over `order_by`.
    #[serde(default)]
    pub random: bool,
}

impl SampleDataParams {
    pub fn where_clause(&self) -> Option<&str> {
        non_blank(&self.where_clause)
    }

    pub fn order_by(&self) -> Option<&str> {
        non_blank(&self.order_by)
    }
}

/// Parameters for `get_unique_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UniqueValuesParams {
    /// Connection ID.
    #[validate(length(min = 1, message = "database must not be empty"))]
    pub database: String,
    /// Table containing the column.
    #[validate(length(min = 1, message = "table must not be empty"))]
    pub table: String,
    /// Column to inspect.
    #[validate(length(min = 1, message = "column must not be empty"))]
    pub column: String,
    /// Maximum number of distinct values.
    #[serde(default = "default_unique_limit", deserialize_with = "deserialize_limit")]
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: u32,
    /// Raw WHERE fragment (trusted caller).
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    /// Group and count each value (with its percentage of the table).
    #[serde(default = "default_true")]
    pub include_counts: bool,
    /// Keep NULL as a value.
    #[serde(default = "default_true")]
    pub include_nulls: bool,
}

impl UniqueValuesParams {
    pub fn where_clause(&self) -> Option<&str> {
        non_blank(&self.where_clause)
    }
}

/// Text produced by one capability call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CapabilityOutput {
    /// Capability wire name.
    pub capability: String,
    /// The aggregated report, ready for display.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sample_data_defaults() {
        let p: SampleDataParams =
            serde_json::from_value(json!({"database": "my1", "table": "orders"})).unwrap();
        assert_eq!(p.limit, 10);
        assert!(!p.random);
        assert_eq!(p.where_clause(), None);
    }

    #[test]
    fn test_unique_values_defaults() {
        let p: UniqueValuesParams = serde_json::from_value(
            json!({"database": "pg1", "table": "orders", "column": "status"}),
        )
        .unwrap();
        assert_eq!(p.limit, 100);
        assert!(p.include_counts);
        assert!(p.include_nulls);
    }

    #[test]
    fn test_views_include_definition_defaults_true() {
        let p: ViewsParams = serde_json::from_value(json!({"database": "pg1"})).unwrap();
        assert!(p.include_definition);
        assert_eq!(p.view(), None);
    }

    #[test]
    fn test_blank_filter_is_absent() {
        let p: IndexesParams =
            serde_json::from_value(json!({"database": "pg1", "table": "  "})).unwrap();
        assert_eq!(p.table(), None);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let err = serde_json::from_value::<TableStatsParams>(json!({"database": "pg1"}))
            .unwrap_err();
        assert!(err.to_string().contains("table"));
    }

    #[test]
    fn test_limit_accepts_integral_float() {
        let p: SampleDataParams = serde_json::from_value(
            json!({"database": "pg1", "table": "orders", "limit": 10.0}),
        )
        .unwrap();
        assert_eq!(p.limit, 10);

        let p: UniqueValuesParams = serde_json::from_value(
            json!({"database": "pg1", "table": "orders", "column": "status", "limit": 25}),
        )
        .unwrap();
        assert_eq!(p.limit, 25);
    }

    #[test]
    fn test_fractional_or_negative_limit_is_rejected() {
        for limit in [json!(2.5), json!(-1), json!("10")] {
            let res = serde_json::from_value::<SampleDataParams>(
                json!({"database": "pg1", "table": "orders", "limit": limit}),
            );
            assert!(res.is_err(), "{limit}");
        }
    }

    #[test]
    fn test_zero_limit_fails_validation() {
        let p: SampleDataParams = serde_json::from_value(
            json!({"database": "pg1", "table": "orders", "limit": 0}),
        )
        .unwrap();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_is_query_uses_camel_case_key() {
        let p: ExecuteSqlParams = serde_json::from_value(
            json!({"sql": "SELECT 1", "database": "pg1", "isQuery": true}),
        )
        .unwrap();
        assert_eq!(p.is_query, Some(true));
        assert!(p.params.is_empty());
    }
}
