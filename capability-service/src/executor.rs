//! Execution collaborator.
//!
//! The dispatcher never talks to a database directly; it goes through an
//! [`Executor`]. [`crate::pool_manager::PoolManager`] is the sqlx-backed
//! implementation; tests substitute an in-memory one.

use async_trait::async_trait;
use common::errors::AppResult;
use tokio_util::sync::CancellationToken;

/// Loosely-typed attributes describing one connection.
pub type DatabaseInfo = serde_json::Map<String, serde_json::Value>;

/// Runs SQL against registered connections and describes them.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Configured database type of `id`, as written in its config.
    async fn database_type(&self, id: &str) -> AppResult<String>;

    /// Runs a row-producing statement and renders the rows as text.
    async fn execute_query(
        &self,
        cancel: &CancellationToken,
        id: &str,
        sql: &str,
        params: &[String],
    ) -> AppResult<String>;

    /// Runs a mutating statement and reports the affected row count as text.
    async fn execute_statement(
        &self,
        cancel: &CancellationToken,
        id: &str,
        sql: &str,
        params: &[String],
    ) -> AppResult<String>;

    /// Registered connection IDs, ordered.
    async fn list_databases(&self) -> Vec<String>;

    /// `host`, `port`, `database`, `description` and `type` of `id`.
    async fn database_info(&self, id: &str) -> AppResult<DatabaseInfo>;
}
