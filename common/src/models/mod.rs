//! Shared data models.

pub mod capability;
pub mod connection;
pub mod database;
pub mod query;

pub use capability::{
    CapabilityOutput, ConstraintsParams, DatabaseStatsParams, ExecuteSqlParams, IndexesParams,
    SampleDataParams, SchemasParams, TableStatsParams, TypesParams, UniqueValuesParams,
    ViewsParams,
};
pub use connection::{ConnectionConfig, ConnectionItem};
pub use database::DatabaseItem;
pub use query::{ColumnInfo, QueryResult};
