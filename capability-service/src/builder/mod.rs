//! Dialect query builder.
//!
//! Pure functions from a validated [`CapabilityRequest`] and a resolved
//! [`Dialect`] to the SQL that answers it. Every (capability, dialect) pair is
//! spelled out in [`build`]; a pair without a builder yields
//! `UnsupportedDialect`. Nothing here touches a connection.
//!
//! Identifiers are quoted with [`Dialect::quote_ident`] and name filters with
//! [`Dialect::quote_literal`]. Caller-supplied WHERE and ORDER BY fragments are
//! trimmed and otherwise passed through verbatim; a WHERE fragment is wrapped
//! in parentheses before anything is appended to it.

mod mysql;
mod postgres;
mod sqlite;

use common::errors::{AppError, AppResult};
use common::models::capability::{ExecuteSqlParams, SampleDataParams, UniqueValuesParams};
use common::utils::{SqlClassifier, StatementKind};

use crate::capability::CapabilityRequest;
use crate::dialect::Dialect;

/// One generated SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    pub kind: StatementKind,
    /// Positional parameters, only ever set for free-form SQL.
    pub params: Vec<String>,
}

impl SqlStatement {
    /// A row-producing statement without parameters.
    pub fn query(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            kind: StatementKind::Query,
            params: Vec::new(),
        }
    }
}

/// What happens when one statement of a plan fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the error in that statement's section and keep going.
    Inline,
    /// Fail the whole call with the execution error.
    Abort,
}

/// The builder's answer for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Statements to execute in order.
    Statements {
        statements: Vec<SqlStatement>,
        policy: FailurePolicy,
    },
    /// Text returned as-is; nothing is executed.
    Notice(String),
}

impl Plan {
    /// Independent statements whose failures are reported inline.
    pub fn inline(statements: Vec<SqlStatement>) -> Self {
        Plan::Statements {
            statements,
            policy: FailurePolicy::Inline,
        }
    }

    /// A single statement whose failure fails the call.
    pub fn single(statement: SqlStatement) -> Self {
        Plan::Statements {
            statements: vec![statement],
            policy: FailurePolicy::Abort,
        }
    }

    /// Statements of the plan; empty for a notice.
    pub fn statements(&self) -> &[SqlStatement] {
        match self {
            Plan::Statements { statements, .. } => statements,
            Plan::Notice(_) => &[],
        }
    }
}

/// Builds the plan answering `request` on `dialect`.
///
/// Deterministic: the same request and dialect always give the same SQL.
pub fn build(dialect: Dialect, request: &CapabilityRequest) -> AppResult<Plan> {
    use CapabilityRequest as R;
    use Dialect::*;

    let capability = request.capability();
    let unsupported =
        || -> AppResult<Plan> { Err(AppError::unsupported(dialect.as_str(), capability.name())) };

    match (request, dialect) {
        (R::ExecuteSql(p), Postgres | MySql | Sqlite) => Ok(execute_sql(p)),

        (R::ListDatabases, Postgres | MySql | Sqlite) => Err(AppError::Internal(
            "list_databases is answered from the registry, not from SQL".to_string(),
        )),

        (R::GetStats(p), Postgres) => Ok(Plan::inline(postgres::stats(p.detailed))),
        (R::GetStats(p), MySql) => Ok(Plan::inline(mysql::stats(p.detailed))),
        (R::GetStats(p), Sqlite) => Ok(Plan::inline(sqlite::stats(p.detailed))),

        (R::GetTableStats(p), Postgres) => Ok(Plan::inline(postgres::table_stats(&p.table, p.detailed))),
        (R::GetTableStats(p), MySql) => Ok(Plan::inline(mysql::table_stats(&p.table, p.detailed))),
        (R::GetTableStats(p), Sqlite) => Ok(Plan::inline(sqlite::table_stats(&p.table, p.detailed))),

        (R::GetIndexes(p), Postgres) => Ok(Plan::single(postgres::indexes(p.table(), p.detailed))),
        (R::GetIndexes(p), MySql) => Ok(Plan::single(mysql::indexes(p.table(), p.detailed))),
        (R::GetIndexes(p), Sqlite) => Ok(Plan::single(sqlite::indexes(p.table(), p.detailed))),

        (R::GetConstraints(p), Postgres) => Ok(Plan::single(postgres::constraints(
            p.table(),
            p.constraint_type(),
        ))),
        (R::GetConstraints(p), MySql) => Ok(Plan::single(mysql::constraints(
            p.table(),
            p.constraint_type(),
        ))),
        (R::GetConstraints(_), Sqlite) => unsupported(),

        (R::GetViews(p), Postgres) => Ok(Plan::single(postgres::views(p.view(), p.include_definition))),
        (R::GetViews(p), MySql) => Ok(Plan::single(mysql::views(p.view(), p.include_definition))),
        (R::GetViews(p), Sqlite) => Ok(Plan::single(sqlite::views(p.view(), p.include_definition))),

        (R::GetTypes(p), Postgres) => Ok(Plan::single(postgres::types(p.type_name()))),
        (R::GetTypes(_), MySql) => Ok(Plan::Notice(mysql::TYPES_NOTICE.to_string())),
        (R::GetTypes(_), Sqlite) => unsupported(),

        (R::GetSchemas(p), Postgres) => Ok(Plan::single(postgres::schemas(
            p.schema(),
            p.include_system_schemas,
        ))),
        (R::GetSchemas(p), MySql) => Ok(Plan::single(mysql::schemas(p.schema()))),
        (R::GetSchemas(p), Sqlite) => Ok(Plan::single(sqlite::schemas(
            p.schema(),
            p.include_system_schemas,
        ))),

        (R::GetSampleData(p), Postgres | MySql | Sqlite) => {
            Ok(Plan::single(sample_data(dialect, p)))
        }
        (R::GetUniqueValues(p), Postgres | MySql | Sqlite) => {
            Ok(Plan::single(unique_values(dialect, p)))
        }
    }
}

/// Free-form SQL, routed by the explicit flag or the leading keyword.
fn execute_sql(p: &ExecuteSqlParams) -> Plan {
    Plan::single(SqlStatement {
        sql: p.sql.clone(),
        kind: SqlClassifier::resolve(&p.sql, p.is_query),
        params: p.params.clone(),
    })
}

/// `SELECT * FROM t [WHERE …] [ORDER BY random | …] LIMIT n`.
///
/// `random` wins over an explicit `order_by`.
pub fn sample_data(dialect: Dialect, p: &SampleDataParams) -> SqlStatement {
    let mut sql = format!("SELECT * FROM {}", dialect.quote_ident(&p.table));

    if let Some(filter) = p.where_clause() {
        sql.push_str(&format!(" WHERE ({filter})"));
    }

    if p.random {
        sql.push_str(&format!(" ORDER BY {}", dialect.random_function()));
    } else if let Some(order) = p.order_by() {
        sql.push_str(&format!(" ORDER BY {order}"));
    }

    sql.push_str(&format!(" LIMIT {}", p.limit));
    SqlStatement::query(sql)
}

/// Distinct values of one column.
///
/// With counts: `GROUP BY` the column with its count and its share of the
/// whole table, most frequent first. Without: `SELECT DISTINCT`, ordered by
/// the column.
pub fn unique_values(dialect: Dialect, p: &UniqueValuesParams) -> SqlStatement {
    let table = dialect.quote_ident(&p.table);
    let column = dialect.quote_ident(&p.column);

    let mut sql = if p.include_counts {
        format!(
            "SELECT {column}, COUNT(*) AS count, \
             ROUND(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM {table}), 2) AS percentage \
             FROM {table}"
        )
    } else {
        format!("SELECT DISTINCT {column} FROM {table}")
    };

    let filter = p.where_clause();
    if let Some(filter) = filter {
        sql.push_str(&format!(" WHERE ({filter})"));
    }

    if !p.include_nulls {
        let joiner = if filter.is_some() { "AND" } else { "WHERE" };
        sql.push_str(&format!(" {joiner} {column} IS NOT NULL"));
    }

    if p.include_counts {
        sql.push_str(&format!(" GROUP BY {column} ORDER BY COUNT(*) DESC"));
    } else {
        sql.push_str(&format!(" ORDER BY {column}"));
    }

    sql.push_str(&format!(" LIMIT {}", p.limit));
    SqlStatement::query(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use serde_json::json;

    fn request(capability: Capability, params: serde_json::Value) -> CapabilityRequest {
        CapabilityRequest::parse(capability, params).unwrap()
    }

    fn only_sql(plan: &Plan) -> &str {
        let statements = plan.statements();
        assert_eq!(statements.len(), 1);
        &statements[0].sql
    }

    #[test]
    fn test_postgres_schemas_exclude_catalog_schemas() {
        let req = request(
            Capability::GetSchemas,
            json!({"database": "pg1", "include_system_schemas": false}),
        );
        let plan = build(Dialect::Postgres, &req).unwrap();
        let sql = only_sql(&plan);
        assert!(sql.contains("NOT IN ('pg_catalog', 'information_schema'"));

        let req = request(
            Capability::GetSchemas,
            json!({"database": "pg1", "include_system_schemas": true}),
        );
        let plan = build(Dialect::Postgres, &req).unwrap();
        assert!(!only_sql(&plan).contains("NOT IN"));
    }

    #[test]
    fn test_mysql_random_sample_uses_rand_and_default_limit() {
        let req = request(
            Capability::GetSampleData,
            json!({"database": "my1", "table": "orders", "random": true, "order_by": "id"}),
        );
        let plan = build(Dialect::MySql, &req).unwrap();
        let sql = only_sql(&plan);
        assert_eq!(sql, "SELECT * FROM `orders` ORDER BY RAND() LIMIT 10");
        assert!(sql.ends_with("ORDER BY RAND() LIMIT 10"));
    }

    #[test]
    fn test_sample_with_filter_and_order() {
        let req = request(
            Capability::GetSampleData,
            json!({"database": "pg1", "table": "orders", "where": " total > 5 ", "order_by": "id DESC", "limit": 3}),
        );
        let plan = build(Dialect::Postgres, &req).unwrap();
        assert_eq!(
            only_sql(&plan),
            "SELECT * FROM \"orders\" WHERE (total > 5) ORDER BY id DESC LIMIT 3"
        );
    }

    #[test]
    fn test_unique_values_without_counts_is_distinct() {
        let req = request(
            Capability::GetUniqueValues,
            json!({"database": "pg1", "table": "orders", "column": "status", "include_counts": false, "limit": 5}),
        );
        let plan = build(Dialect::Postgres, &req).unwrap();
        let sql = only_sql(&plan);
        assert_eq!(
            sql,
            "SELECT DISTINCT \"status\" FROM \"orders\" ORDER BY \"status\" LIMIT 5"
        );
        assert!(!sql.contains("GROUP BY"));
        assert!(!sql.contains("COUNT"));
    }

    #[test]
    fn test_unique_values_with_counts_and_null_exclusion() {
        let req = request(
            Capability::GetUniqueValues,
            json!({"database": "my1", "table": "orders", "column": "status", "where": "total > 0", "include_nulls": false}),
        );
        let plan = build(Dialect::MySql, &req).unwrap();
        let sql = only_sql(&plan);
        assert!(sql.starts_with("SELECT `status`, COUNT(*) AS count"));
        assert!(sql.contains("(SELECT COUNT(*) FROM `orders`)"));
        assert!(sql.contains(" WHERE (total > 0) AND `status` IS NOT NULL"));
        assert!(sql.ends_with("GROUP BY `status` ORDER BY COUNT(*) DESC LIMIT 100"));
    }

    #[test]
    fn test_null_exclusion_applies_to_every_branch_of_an_or_filter() {
        let req = request(
            Capability::GetUniqueValues,
            json!({"database": "lite", "table": "o", "column": "s", "where": "id = 2 OR id = 3",
                   "include_counts": false, "include_nulls": false}),
        );
        let plan = build(Dialect::Sqlite, &req).unwrap();
        assert_eq!(
            only_sql(&plan),
            "SELECT DISTINCT \"s\" FROM \"o\" WHERE (id = 2 OR id = 3) AND \"s\" IS NOT NULL ORDER BY \"s\" LIMIT 100"
        );
    }

    #[test]
    fn test_null_exclusion_without_filter_opens_where() {
        let req = request(
            Capability::GetUniqueValues,
            json!({"database": "pg1", "table": "t", "column": "c", "include_counts": false, "include_nulls": false}),
        );
        let plan = build(Dialect::Sqlite, &req).unwrap();
        assert_eq!(
            only_sql(&plan),
            "SELECT DISTINCT \"c\" FROM \"t\" WHERE \"c\" IS NOT NULL ORDER BY \"c\" LIMIT 100"
        );
    }

    #[test]
    fn test_identifiers_with_quotes_are_doubled() {
        let req = request(
            Capability::GetUniqueValues,
            json!({"database": "pg1", "table": "we\"ird", "column": "co\"l", "include_counts": false}),
        );
        let sql = only_sql(&build(Dialect::Postgres, &req).unwrap()).to_string();
        assert!(sql.contains("\"we\"\"ird\""));
        assert!(sql.contains("\"co\"\"l\""));

        let req = request(
            Capability::GetSampleData,
            json!({"database": "my1", "table": "a`b"}),
        );
        assert!(only_sql(&build(Dialect::MySql, &req).unwrap()).contains("`a``b`"));
    }

    #[test]
    fn test_name_filters_are_literal_escaped() {
        let req = request(
            Capability::GetIndexes,
            json!({"database": "pg1", "table": "o'brien"}),
        );
        for dialect in Dialect::ALL {
            let plan = build(dialect, &req).unwrap();
            assert!(only_sql(&plan).contains("'o''brien'"), "{dialect}");
        }

        let req = request(
            Capability::GetTableStats,
            json!({"database": "pg1", "table": "o'brien", "detailed": true}),
        );
        for dialect in Dialect::ALL {
            let plan = build(dialect, &req).unwrap();
            for statement in plan.statements() {
                assert!(!statement.sql.contains("'o'brien'"), "{dialect}: {}", statement.sql);
            }
        }
    }

    #[test]
    fn test_building_is_deterministic() {
        let requests = vec![
            request(Capability::GetStats, json!({"database": "x", "detailed": true})),
            request(Capability::GetTableStats, json!({"database": "x", "table": "t", "detailed": true})),
            request(Capability::GetIndexes, json!({"database": "x", "detailed": true})),
            request(Capability::GetViews, json!({"database": "x", "view": "v"})),
            request(Capability::GetSchemas, json!({"database": "x", "schema": "s"})),
            request(Capability::GetSampleData, json!({"database": "x", "table": "t", "random": true})),
        ];
        for dialect in Dialect::ALL {
            for req in &requests {
                assert_eq!(build(dialect, req).unwrap(), build(dialect, req).unwrap());
            }
        }
    }

    #[test]
    fn test_statistics_plans_are_inline_and_grow_when_detailed() {
        for dialect in Dialect::ALL {
            let basic = build(dialect, &request(Capability::GetStats, json!({"database": "x"}))).unwrap();
            let detailed = build(
                dialect,
                &request(Capability::GetStats, json!({"database": "x", "detailed": true})),
            )
            .unwrap();
            assert!(matches!(basic, Plan::Statements { policy: FailurePolicy::Inline, .. }));
            assert!(basic.statements().len() >= 3, "{dialect}");
            assert!(detailed.statements().len() > basic.statements().len(), "{dialect}");
            assert!(detailed.statements().starts_with(basic.statements()));
            assert!(basic.statements().iter().all(|s| s.kind == StatementKind::Query));
        }
    }

    #[test]
    fn test_unsupported_pairs() {
        let constraints = request(Capability::GetConstraints, json!({"database": "lite"}));
        assert!(matches!(
            build(Dialect::Sqlite, &constraints),
            Err(AppError::UnsupportedDialect { dialect, capability })
                if dialect == "sqlite" && capability == "get_constraints"
        ));

        let types = request(Capability::GetTypes, json!({"database": "lite"}));
        assert!(matches!(
            build(Dialect::Sqlite, &types),
            Err(AppError::UnsupportedDialect { .. })
        ));
    }

    #[test]
    fn test_mysql_types_is_a_notice() {
        let types = request(Capability::GetTypes, json!({"database": "my1"}));
        let plan = build(Dialect::MySql, &types).unwrap();
        assert!(matches!(&plan, Plan::Notice(text) if text.starts_with("MySQL does not support custom data types")));
        assert!(plan.statements().is_empty());
    }

    #[test]
    fn test_execute_sql_routing() {
        let update = request(Capability::ExecuteSql, json!({"database": "pg1", "sql": "UPDATE t SET x=1"}));
        let plan = build(Dialect::Postgres, &update).unwrap();
        assert_eq!(plan.statements()[0].kind, StatementKind::Statement);
        assert!(matches!(plan, Plan::Statements { policy: FailurePolicy::Abort, .. }));

        let forced = request(
            Capability::ExecuteSql,
            json!({"database": "pg1", "sql": "WITH x AS (SELECT 1) SELECT * FROM x", "isQuery": true, "params": ["1"]}),
        );
        let plan = build(Dialect::Postgres, &forced).unwrap();
        assert_eq!(plan.statements()[0].kind, StatementKind::Query);
        assert_eq!(plan.statements()[0].params, vec!["1".to_string()]);
    }

    #[test]
    fn test_constraint_filters_combine() {
        let req = request(
            Capability::GetConstraints,
            json!({"database": "pg1", "table": "orders", "constraint_type": "FOREIGN KEY"}),
        );
        let pg = build(Dialect::Postgres, &req).unwrap();
        let sql = only_sql(&pg);
        assert!(sql.contains("tc.table_name = 'orders'"));
        assert!(sql.contains("tc.constraint_type = 'FOREIGN KEY'"));

        let req = request(
            Capability::GetConstraints,
            json!({"database": "my1", "constraint_type": "unique"}),
        );
        let my = build(Dialect::MySql, &req).unwrap();
        assert!(only_sql(&my).contains("tc.constraint_type = 'UNIQUE'"));
    }
}
