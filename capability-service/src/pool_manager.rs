//! Database connection pool manager.
//!
//! Implements [`Executor`] over sqlx pools (MySQL, PostgreSQL, SQLite). Pools
//! are created lazily from the registry's config the first time a connection
//! is used, and rebuilt when the connection is re-registered with a different
//! config. Rows are decoded into JSON cells and rendered as text.

use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::connection::ConnectionConfig;
use common::models::query::{ColumnInfo, QueryResult};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, MySqlPool, PgPool, Row, SqlitePool, TypeInfo, ValueRef};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::dialect::Dialect;
use crate::executor::{DatabaseInfo, Executor};
use crate::registry::ConnectionRegistry;
use crate::render;

/// Connection pool wrapper for the supported database types.
#[derive(Clone, Debug)]
pub enum DatabasePool {
    MySql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DatabasePool {
    async fn close(&self) {
        match self {
            DatabasePool::MySql(p) => p.close().await,
            DatabasePool::Postgres(p) => p.close().await,
            DatabasePool::Sqlite(p) => p.close().await,
        }
    }
}

/// A pool together with the config it was built from.
struct PoolEntry {
    config: ConnectionConfig,
    pool: DatabasePool,
}

/// Manages one sqlx pool per registered connection.
pub struct PoolManager {
    config: AppConfig,
    registry: Arc<ConnectionRegistry>,
    /// Pools indexed by connection ID (cache only).
    pools: RwLock<HashMap<String, PoolEntry>>,
}

impl PoolManager {
    pub fn new(config: AppConfig, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            config,
            registry,
            pools: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns the pool for `id`, creating or rebuilding it as needed.
    pub async fn pool(&self, id: &str) -> AppResult<DatabasePool> {
        let config = self.registry.get(id).await?;

        if let Some(entry) = self.pools.read().await.get(id) {
            if entry.config == config {
                return Ok(entry.pool.clone());
            }
        }

        let pool = self.create_pool(&config).await?;
        let previous = self.pools.write().await.insert(
            id.to_string(),
            PoolEntry {
                config,
                pool: pool.clone(),
            },
        );

        if let Some(previous) = previous {
            tracing::info!(id = %id, "connection config changed, replacing pool");
            tokio::spawn(async move { previous.pool.close().await });
        } else {
            tracing::info!(id = %id, "connection pool created");
        }
        Ok(pool)
    }

    /// Number of live pools.
    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Closes every pool.
    pub async fn close_all(&self) {
        let pools: Vec<PoolEntry> = self.pools.write().await.drain().map(|(_, e)| e).collect();
        for entry in pools {
            entry.pool.close().await;
        }
    }

    async fn create_pool(&self, config: &ConnectionConfig) -> AppResult<DatabasePool> {
        let dialect = Dialect::from_str(&config.db_type)
            .map_err(|_| AppError::unsupported(config.db_type.as_str(), "connection pool"))?;
        let timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let max_connections = self.config.max_connections;
        let failed = |e: sqlx::Error| AppError::DatabaseConnection(format!("{}: {}", config.id, e));

        match dialect {
            Dialect::MySql => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect_with(mysql_options(config))
                    .await
                    .map_err(failed)?;
                Ok(DatabasePool::MySql(pool))
            }
            Dialect::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(timeout)
                    .connect_with(postgres_options(config))
                    .await
                    .map_err(failed)?;
                Ok(DatabasePool::Postgres(pool))
            }
            Dialect::Sqlite => {
                let options = sqlite_options(config)?;
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(timeout)
                    .connect_with(options)
                    .await
                    .map_err(failed)?;
                Ok(DatabasePool::Sqlite(pool))
            }
        }
    }

    /// Bounds `fut` by the query timeout and the caller's cancellation.
    async fn bounded<T>(
        &self,
        cancel: &CancellationToken,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        let secs = self.config.query_timeout_secs;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            res = tokio::time::timeout(Duration::from_secs(secs), fut) => {
                res.map_err(|_| AppError::Timeout(secs))?
            }
        }
    }
}

// ============== Connect options ==============

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

fn mysql_options(config: &ConnectionConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(or_default(&config.host, "localhost"))
        .port(config.port.unwrap_or(3306))
        .username(or_default(&config.user, "root"));
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if !config.name.is_empty() {
        options = options.database(&config.name);
    }
    options
}

fn postgres_options(config: &ConnectionConfig) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(or_default(&config.host, "localhost"))
        .port(config.port.unwrap_or(5432))
        .username(or_default(&config.user, "postgres"))
        .database(or_default(&config.name, "postgres"));
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    options
}

/// SQLite file from `host`, falling back to `name`.
fn sqlite_options(config: &ConnectionConfig) -> AppResult<SqliteConnectOptions> {
    let path = [config.host.trim(), config.name.trim()]
        .into_iter()
        .find(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{}: SQLite requires a file path", config.id)))?;

    SqliteConnectOptions::from_str(&format!("sqlite:{path}"))
        .map(|o| o.create_if_missing(true))
        .map_err(|e| AppError::DatabaseConnection(format!("{}: {}", config.id, e)))
}

// ============== Execution ==============

fn execution_error(e: sqlx::Error) -> AppError {
    AppError::Execution(e.to_string())
}

/// Unbound SQL goes over the simple protocol so any statement the server
/// accepts (SHOW, PRAGMA, …) can run; bound SQL is prepared.
macro_rules! fetch_all {
    ($pool:expr, $sql:expr, $params:expr) => {
        if $params.is_empty() {
            sqlx::raw_sql($sql).fetch_all($pool).await
        } else {
            $params
                .iter()
                .fold(sqlx::query($sql), |q, p| q.bind(p.as_str()))
                .fetch_all($pool)
                .await
        }
    };
}

macro_rules! execute {
    ($pool:expr, $sql:expr, $params:expr) => {
        if $params.is_empty() {
            sqlx::raw_sql($sql).execute($pool).await.map(|r| r.rows_affected())
        } else {
            $params
                .iter()
                .fold(sqlx::query($sql), |q, p| q.bind(p.as_str()))
                .execute($pool)
                .await
                .map(|r| r.rows_affected())
        }
    };
}

async fn run_query(pool: &DatabasePool, sql: &str, params: &[String]) -> AppResult<QueryResult> {
    let result = match pool {
        DatabasePool::MySql(p) => to_result(&fetch_all!(p, sql, params).map_err(execution_error)?, mysql_cells),
        DatabasePool::Postgres(p) => to_result(&fetch_all!(p, sql, params).map_err(execution_error)?, pg_cells),
        DatabasePool::Sqlite(p) => to_result(&fetch_all!(p, sql, params).map_err(execution_error)?, sqlite_cells),
    };
    Ok(result)
}

async fn run_statement(pool: &DatabasePool, sql: &str, params: &[String]) -> AppResult<u64> {
    let rows_affected = match pool {
        DatabasePool::MySql(p) => execute!(p, sql, params),
        DatabasePool::Postgres(p) => execute!(p, sql, params),
        DatabasePool::Sqlite(p) => execute!(p, sql, params),
    };
    rows_affected.map_err(execution_error)
}

#[async_trait]
impl Executor for PoolManager {
    async fn database_type(&self, id: &str) -> AppResult<String> {
        Ok(self.registry.get(id).await?.db_type)
    }

    async fn execute_query(
        &self,
        cancel: &CancellationToken,
        id: &str,
        sql: &str,
        params: &[String],
    ) -> AppResult<String> {
        let pool = self.pool(id).await?;
        let started = Instant::now();
        let result = self.bounded(cancel, run_query(&pool, sql, params)).await?;
        let result = result.with_elapsed(started.elapsed().as_millis() as u64);
        tracing::debug!(
            id = %id,
            rows = result.row_count,
            elapsed_ms = result.execution_time_ms,
            "query executed"
        );
        Ok(render::query_result(&result))
    }

    async fn execute_statement(
        &self,
        cancel: &CancellationToken,
        id: &str,
        sql: &str,
        params: &[String],
    ) -> AppResult<String> {
        let pool = self.pool(id).await?;
        let rows_affected = self.bounded(cancel, run_statement(&pool, sql, params)).await?;
        tracing::debug!(id = %id, rows_affected, "statement executed");
        Ok(render::statement_result(rows_affected))
    }

    async fn list_databases(&self) -> Vec<String> {
        self.registry.ids().await
    }

    async fn database_info(&self, id: &str) -> AppResult<DatabaseInfo> {
        let config = self.registry.get(id).await?;
        let port = config.port.or_else(|| {
            Dialect::from_str(&config.db_type)
                .ok()
                .and_then(|d| d.default_port())
        });

        let info = json!({
            "type": config.db_type,
            "host": config.host,
            "port": port,
            "user": config.user,
            "database": config.name,
            "description": config.description,
        });
        match info {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::Internal("database info is not an object".to_string())),
        }
    }
}

// ============== Row decoding ==============

fn to_result<R: Row>(rows: &[R], cells: fn(&R) -> Vec<Value>) -> QueryResult {
    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|c| ColumnInfo {
                    name: c.name().to_string(),
                    data_type: c.type_info().name().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    QueryResult::new(columns, rows.iter().map(cells).collect())
}

/// Decodes column `$i` as `Option<$ty>`; `None` when the value does not decode.
macro_rules! cell {
    ($row:expr, $i:expr, $ty:ty) => {
        cell!($row, $i, $ty, |v: $ty| json!(v))
    };
    ($row:expr, $i:expr, $ty:ty, $map:expr) => {
        $row.try_get_unchecked::<Option<$ty>, _>($i)
            .ok()
            .map(|v| v.map_or(Value::Null, $map))
    };
}

/// Text, then raw bytes, then a placeholder.
macro_rules! text_cell {
    ($row:expr, $i:expr, $ty_name:expr) => {
        cell!($row, $i, String)
            .or_else(|| cell!($row, $i, Vec<u8>, |b: Vec<u8>| Value::String(String::from_utf8_lossy(&b).into_owned())))
            .unwrap_or_else(|| Value::String(format!("<{}>", $ty_name)))
    };
}

fn decimal(d: Decimal) -> Value {
    Value::String(d.to_string())
}

fn timestamp_tz(t: DateTime<Utc>) -> Value {
    Value::String(t.to_rfc3339())
}

fn timestamp(t: NaiveDateTime) -> Value {
    Value::String(t.to_string())
}

fn date(d: NaiveDate) -> Value {
    Value::String(d.to_string())
}

fn time(t: NaiveTime) -> Value {
    Value::String(t.to_string())
}

/// Runtime type name of column `i`, or `None` for SQL NULL.
fn value_type<R: Row>(row: &R, i: usize) -> Option<String>
where
    usize: sqlx::ColumnIndex<R>,
{
    let raw = row.try_get_raw(i).ok()?;
    if raw.is_null() {
        return None;
    }
    let name = raw.type_info().name().to_ascii_uppercase();
    Some(name)
}

fn pg_cells(row: &PgRow) -> Vec<Value> {
    (0..row.len())
        .map(|i| {
            let Some(ty) = value_type(row, i) else {
                return Value::Null;
            };
            let typed = match ty.as_str() {
                "BOOL" => cell!(row, i, bool),
                "INT2" => cell!(row, i, i16),
                "INT4" => cell!(row, i, i32),
                "INT8" => cell!(row, i, i64),
                "FLOAT4" => cell!(row, i, f32),
                "FLOAT8" => cell!(row, i, f64),
                "NUMERIC" => cell!(row, i, Decimal, decimal),
                "TIMESTAMPTZ" => cell!(row, i, DateTime<Utc>, timestamp_tz),
                "TIMESTAMP" => cell!(row, i, NaiveDateTime, timestamp),
                "DATE" => cell!(row, i, NaiveDate, date),
                "TIME" => cell!(row, i, NaiveTime, time),
                "JSON" | "JSONB" => cell!(row, i, Value, |v: Value| v),
                _ => None,
            };
            typed.unwrap_or_else(|| text_cell!(row, i, ty))
        })
        .collect()
}

fn mysql_cells(row: &MySqlRow) -> Vec<Value> {
    (0..row.len())
        .map(|i| {
            let Some(ty) = value_type(row, i) else {
                return Value::Null;
            };
            let typed = match ty.as_str() {
                "BOOLEAN" => cell!(row, i, bool),
                "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => cell!(row, i, i64),
                "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
                | "BIGINT UNSIGNED" => cell!(row, i, u64),
                "FLOAT" => cell!(row, i, f32),
                "DOUBLE" => cell!(row, i, f64),
                "DECIMAL" => cell!(row, i, Decimal, decimal),
                "TIMESTAMP" => cell!(row, i, DateTime<Utc>, timestamp_tz),
                "DATETIME" => cell!(row, i, NaiveDateTime, timestamp),
                "DATE" => cell!(row, i, NaiveDate, date),
                "TIME" => cell!(row, i, NaiveTime, time),
                "JSON" => cell!(row, i, Value, |v: Value| v),
                _ => None,
            };
            typed.unwrap_or_else(|| text_cell!(row, i, ty))
        })
        .collect()
}

fn sqlite_cells(row: &SqliteRow) -> Vec<Value> {
    (0..row.len())
        .map(|i| {
            let Some(ty) = value_type(row, i) else {
                return Value::Null;
            };
            let typed = match ty.as_str() {
                "INTEGER" => cell!(row, i, i64),
                "REAL" => cell!(row, i, f64),
                "BOOLEAN" => cell!(row, i, bool),
                _ => None,
            };
            typed.unwrap_or_else(|| text_cell!(row, i, ty))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_config(id: &str) -> ConnectionConfig {
        ConnectionConfig {
            id: id.to_string(),
            db_type: "sqlite".to_string(),
            host: ":memory:".to_string(),
            port: None,
            user: String::new(),
            password: String::new(),
            name: String::new(),
            description: "scratch".to_string(),
        }
    }

    async fn manager(configs: Vec<ConnectionConfig>) -> PoolManager {
        let registry = Arc::new(ConnectionRegistry::with_configs(configs));
        PoolManager::new(AppConfig::default(), registry)
    }

    #[tokio::test]
    async fn test_sqlite_statement_then_query() {
        let manager = manager(vec![sqlite_config("lite")]).await;
        let cancel = CancellationToken::new();

        let created = manager
            .execute_statement(&cancel, "lite", "CREATE TABLE orders (id INTEGER, status TEXT, total REAL)", &[])
            .await
            .unwrap();
        assert_eq!(created, "Statement executed successfully. Rows affected: 0");

        let inserted = manager
            .execute_statement(
                &cancel,
                "lite",
                "INSERT INTO orders VALUES (1, 'paid', 9.5), (2, NULL, 3.0)",
                &[],
            )
            .await
            .unwrap();
        assert_eq!(inserted, "Statement executed successfully. Rows affected: 2");

        let text = manager
            .execute_query(&cancel, "lite", "SELECT id, status, total FROM orders ORDER BY id", &[])
            .await
            .unwrap();
        assert!(text.starts_with("| id | status | total |\n| --- | --- | --- |\n"));
        assert!(text.contains("| 1 | paid | 9.5 |"));
        assert!(text.contains("| 2 | NULL | 3.0 |"));
        assert!(text.ends_with("(2 rows)"));
    }

    #[tokio::test]
    async fn test_bound_parameters() {
        let manager = manager(vec![sqlite_config("lite")]).await;
        let cancel = CancellationToken::new();
        manager
            .execute_statement(&cancel, "lite", "CREATE TABLE t (name TEXT)", &[])
            .await
            .unwrap();
        manager
            .execute_statement(&cancel, "lite", "INSERT INTO t VALUES (?)", &["o'brien".to_string()])
            .await
            .unwrap();
        let text = manager
            .execute_query(&cancel, "lite", "SELECT name FROM t WHERE name = ?", &["o'brien".to_string()])
            .await
            .unwrap();
        assert!(text.contains("| o'brien |"));
        assert!(text.ends_with("(1 rows)"));
    }

    #[tokio::test]
    async fn test_sql_error_is_execution_error() {
        let manager = manager(vec![sqlite_config("lite")]).await;
        let err = manager
            .execute_query(&CancellationToken::new(), "lite", "SELECT * FROM missing", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Execution(msg) if msg.contains("missing")));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_execution() {
        let manager = manager(vec![sqlite_config("lite")]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = manager
            .execute_query(&cancel, "lite", "SELECT 1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let manager = manager(vec![]).await;
        let err = manager
            .execute_query(&CancellationToken::new(), "nope", "SELECT 1", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConnectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_pool_reused_until_config_changes() {
        let manager = manager(vec![sqlite_config("lite")]).await;
        let cancel = CancellationToken::new();
        manager
            .execute_statement(&cancel, "lite", "CREATE TABLE kept (x INTEGER)", &[])
            .await
            .unwrap();
        // same pool, same in-memory database
        manager
            .execute_query(&cancel, "lite", "SELECT x FROM kept", &[])
            .await
            .unwrap();
        assert_eq!(manager.pool_count().await, 1);

        let mut changed = sqlite_config("lite");
        changed.description = "rebuilt".to_string();
        manager.registry().register(changed).await;

        // new pool, fresh in-memory database
        let err = manager
            .execute_query(&cancel, "lite", "SELECT x FROM kept", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Execution(_)));
        assert_eq!(manager.pool_count().await, 1);
        manager.close_all().await;
        assert_eq!(manager.pool_count().await, 0);
    }

    #[tokio::test]
    async fn test_database_info_uses_default_port() {
        let mut pg = sqlite_config("pg1");
        pg.db_type = "postgres".to_string();
        pg.host = "db1".to_string();
        pg.name = "shop".to_string();
        let manager = manager(vec![pg]).await;

        let info = manager.database_info("pg1").await.unwrap();
        assert_eq!(info["port"], json!(5432));
        assert_eq!(info["database"], json!("shop"));
        assert_eq!(info["host"], json!("db1"));
        assert!(!info.contains_key("password"));
        assert_eq!(manager.database_type("pg1").await.unwrap(), "postgres");
        assert_eq!(manager.list_databases().await, vec!["pg1".to_string()]);
    }

    #[tokio::test]
    async fn test_unsupported_type_cannot_open_a_pool() {
        let mut ora = sqlite_config("ora");
        ora.db_type = "oracle".to_string();
        let manager = manager(vec![ora]).await;
        let err = manager.pool("ora").await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedDialect { .. }));
    }
}
