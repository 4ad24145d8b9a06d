//! Capability catalog.
//!
//! A capability is a dialect-independent operation exposed at the service
//! boundary. Each one publishes a name, a description and a parameter schema;
//! incoming parameter objects are turned into a typed [`CapabilityRequest`]
//! here, before any SQL is built.

use std::fmt;

use common::errors::{AppError, AppResult};
use common::models::capability::{
    ConstraintsParams, DatabaseStatsParams, ExecuteSqlParams, IndexesParams, SampleDataParams,
    SchemasParams, TableStatsParams, TypesParams, UniqueValuesParams, ViewsParams,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

/// Every capability the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ExecuteSql,
    ListDatabases,
    GetStats,
    GetTableStats,
    GetIndexes,
    GetConstraints,
    GetViews,
    GetTypes,
    GetSchemas,
    GetSampleData,
    GetUniqueValues,
}

/// Kind of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Array,
}

/// One declared parameter of a capability.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
    /// Default applied when the parameter is omitted, rendered as text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

/// Published description of a capability.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CapabilityDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParamSpec>,
}

const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
        description,
        default: None,
    }
}

const fn optional(
    name: &'static str,
    kind: ParamKind,
    description: &'static str,
    default: &'static str,
) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        description,
        default: Some(default),
    }
}

const DATABASE: ParamSpec = required("database", ParamKind::String, "Database ID to use");

impl Capability {
    pub const ALL: [Capability; 11] = [
        Capability::ExecuteSql,
        Capability::ListDatabases,
        Capability::GetStats,
        Capability::GetTableStats,
        Capability::GetIndexes,
        Capability::GetConstraints,
        Capability::GetViews,
        Capability::GetTypes,
        Capability::GetSchemas,
        Capability::GetSampleData,
        Capability::GetUniqueValues,
    ];

    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::ExecuteSql => "execute_sql",
            Capability::ListDatabases => "list_databases",
            Capability::GetStats => "get_stats",
            Capability::GetTableStats => "get_table_stats",
            Capability::GetIndexes => "get_indexes",
            Capability::GetConstraints => "get_constraints",
            Capability::GetViews => "get_views",
            Capability::GetTypes => "get_types",
            Capability::GetSchemas => "get_schemas",
            Capability::GetSampleData => "get_sample_data",
            Capability::GetUniqueValues => "get_unique_values",
        }
    }

    /// Looks a capability up by wire name.
    pub fn from_name(name: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| AppError::CapabilityNotFound(name.to_string()))
    }

    pub fn description(&self) -> &'static str {
        match self {
            Capability::ExecuteSql => {
                "Execute SQL queries or statements on any configured database"
            }
            Capability::ListDatabases => {
                "List all configured database connections with their type, host, port, name and description"
            }
            Capability::GetStats => {
                "Retrieve database statistics: size, connections, largest tables and, when detailed, buffer/cache and I/O metrics"
            }
            Capability::GetTableStats => {
                "Retrieve statistics for a specific table: size, row count, columns, indexes and, when detailed, I/O metrics"
            }
            Capability::GetIndexes => "Retrieve indexes from a database with their columns and types",
            Capability::GetConstraints => {
                "Retrieve primary key, foreign key, unique, check and exclusion constraints"
            }
            Capability::GetViews => "Retrieve views from a database with their definitions",
            Capability::GetTypes => "Retrieve custom data types (enum, composite, domain, range)",
            Capability::GetSchemas => "Retrieve schemas with owners, privileges and object counts",
            Capability::GetSampleData => "Retrieve a sample of rows from a table",
            Capability::GetUniqueValues => {
                "Retrieve the distinct values of a column, optionally with counts and percentages"
            }
        }
    }

    /// Declared parameters.
    pub fn params(&self) -> Vec<ParamSpec> {
        use ParamKind::*;
        match self {
            Capability::ExecuteSql => vec![
                required("sql", String, "SQL query or statement to execute"),
                required("database", String, "Database ID to execute the SQL on"),
                optional("params", Array, "SQL parameters", "[]"),
                optional(
                    "isQuery",
                    Boolean,
                    "true for queries, false for statements (INSERT, UPDATE, DELETE)",
                    "auto-detect",
                ),
            ],
            Capability::ListDatabases => vec![],
            Capability::GetStats => vec![
                DATABASE,
                optional("detailed", Boolean, "Include detailed statistics (may be slower)", "false"),
            ],
            Capability::GetTableStats => vec![
                DATABASE,
                required("table", String, "Table name to get statistics for"),
                optional("detailed", Boolean, "Include detailed statistics (may be slower)", "false"),
            ],
            Capability::GetIndexes => vec![
                DATABASE,
                optional("table", String, "Table name to get indexes for", "all"),
                optional("detailed", Boolean, "Include detailed index information", "false"),
            ],
            Capability::GetConstraints => vec![
                DATABASE,
                optional("table", String, "Table name to get constraints for", "all"),
                optional(
                    "constraint_type",
                    String,
                    "PRIMARY KEY, FOREIGN KEY, UNIQUE, CHECK or EXCLUSION",
                    "all",
                ),
            ],
            Capability::GetViews => vec![
                DATABASE,
                optional("view", String, "View name to get the definition for", "all"),
                optional("include_definition", Boolean, "Include each view's SQL definition", "true"),
            ],
            Capability::GetTypes => vec![
                DATABASE,
                optional("type_name", String, "Type name to get the definition for", "all"),
            ],
            Capability::GetSchemas => vec![
                DATABASE,
                optional("schema", String, "Schema name to get information for", "all"),
                optional(
                    "include_system_schemas",
                    Boolean,
                    "Include system schemas like pg_catalog and information_schema",
                    "false",
                ),
            ],
            Capability::GetSampleData => vec![
                DATABASE,
                required("table", String, "Table name to get sample data from"),
                optional("limit", Number, "Maximum number of rows to retrieve", "10"),
                optional("where", String, "WHERE clause to filter the data", "none"),
                optional("order_by", String, "ORDER BY clause to sort the data", "none"),
                optional("random", Boolean, "Retrieve random rows", "false"),
            ],
            Capability::GetUniqueValues => vec![
                DATABASE,
                required("table", String, "Table name containing the column"),
                required("column", String, "Column name to get unique values from"),
                optional("limit", Number, "Maximum number of unique values to retrieve", "100"),
                optional("where", String, "WHERE clause to filter the data", "none"),
                optional("include_counts", Boolean, "Include counts for each unique value", "true"),
                optional("include_nulls", Boolean, "Include NULL values", "true"),
            ],
        }
    }

    pub fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: self.name(),
            description: self.description(),
            parameters: self.params(),
        }
    }

    /// Descriptors for the whole catalog.
    pub fn catalog() -> Vec<CapabilityDescriptor> {
        Self::ALL.iter().map(Capability::descriptor).collect()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated capability invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityRequest {
    ExecuteSql(ExecuteSqlParams),
    ListDatabases,
    GetStats(DatabaseStatsParams),
    GetTableStats(TableStatsParams),
    GetIndexes(IndexesParams),
    GetConstraints(ConstraintsParams),
    GetViews(ViewsParams),
    GetTypes(TypesParams),
    GetSchemas(SchemasParams),
    GetSampleData(SampleDataParams),
    GetUniqueValues(UniqueValuesParams),
}

fn typed<T: DeserializeOwned + Validate>(params: serde_json::Value) -> AppResult<T> {
    let parsed: T = serde_json::from_value(params)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

impl CapabilityRequest {
    /// Parses and validates a JSON parameter object for `capability`.
    ///
    /// `null` is treated as an empty object; any other non-object is rejected.
    pub fn parse(capability: Capability, params: serde_json::Value) -> AppResult<Self> {
        let params = match params {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            obj @ serde_json::Value::Object(_) => obj,
            other => {
                return Err(AppError::Validation(format!(
                    "parameters must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        Ok(match capability {
            Capability::ExecuteSql => CapabilityRequest::ExecuteSql(typed(params)?),
            Capability::ListDatabases => CapabilityRequest::ListDatabases,
            Capability::GetStats => CapabilityRequest::GetStats(typed(params)?),
            Capability::GetTableStats => CapabilityRequest::GetTableStats(typed(params)?),
            Capability::GetIndexes => CapabilityRequest::GetIndexes(typed(params)?),
            Capability::GetConstraints => CapabilityRequest::GetConstraints(typed(params)?),
            Capability::GetViews => CapabilityRequest::GetViews(typed(params)?),
            Capability::GetTypes => CapabilityRequest::GetTypes(typed(params)?),
            Capability::GetSchemas => CapabilityRequest::GetSchemas(typed(params)?),
            Capability::GetSampleData => CapabilityRequest::GetSampleData(typed(params)?),
            Capability::GetUniqueValues => CapabilityRequest::GetUniqueValues(typed(params)?),
        })
    }

    pub fn capability(&self) -> Capability {
        match self {
            CapabilityRequest::ExecuteSql(_) => Capability::ExecuteSql,
            CapabilityRequest::ListDatabases => Capability::ListDatabases,
            CapabilityRequest::GetStats(_) => Capability::GetStats,
            CapabilityRequest::GetTableStats(_) => Capability::GetTableStats,
            CapabilityRequest::GetIndexes(_) => Capability::GetIndexes,
            CapabilityRequest::GetConstraints(_) => Capability::GetConstraints,
            CapabilityRequest::GetViews(_) => Capability::GetViews,
            CapabilityRequest::GetTypes(_) => Capability::GetTypes,
            CapabilityRequest::GetSchemas(_) => Capability::GetSchemas,
            CapabilityRequest::GetSampleData(_) => Capability::GetSampleData,
            CapabilityRequest::GetUniqueValues(_) => Capability::GetUniqueValues,
        }
    }

    /// Target connection ID; `None` only for `list_databases`.
    pub fn connection_id(&self) -> Option<&str> {
        match self {
            CapabilityRequest::ExecuteSql(p) => Some(&p.database),
            CapabilityRequest::ListDatabases => None,
            CapabilityRequest::GetStats(p) => Some(&p.database),
            CapabilityRequest::GetTableStats(p) => Some(&p.database),
            CapabilityRequest::GetIndexes(p) => Some(&p.database),
            CapabilityRequest::GetConstraints(p) => Some(&p.database),
            CapabilityRequest::GetViews(p) => Some(&p.database),
            CapabilityRequest::GetTypes(p) => Some(&p.database),
            CapabilityRequest::GetSchemas(p) => Some(&p.database),
            CapabilityRequest::GetSampleData(p) => Some(&p.database),
            CapabilityRequest::GetUniqueValues(p) => Some(&p.database),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
