//! SQLite queries built on `sqlite_master` and the table-valued pragma
//! functions.

use super::SqlStatement;
use crate::dialect::Dialect;

const LITE: Dialect = Dialect::Sqlite;

const DATABASE_SIZE: &str = "\
SELECT
    page_count * page_size AS database_size_bytes,
    page_count,
    page_size,
    freelist_count
FROM pragma_page_count(), pragma_page_size(), pragma_freelist_count();";

const ATTACHED: &str = "SELECT seq, name AS schema_name, file FROM pragma_database_list ORDER BY seq;";

const OBJECTS: &str = "\
SELECT
    type,
    name,
    tbl_name AS table_name
FROM sqlite_master
WHERE name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
ORDER BY type, name;";

const SETTINGS: &str = "\
SELECT
    journal_mode,
    cache_size,
    auto_vacuum,
    synchronous
FROM pragma_journal_mode(), pragma_cache_size(), pragma_auto_vacuum(), pragma_synchronous();";

const COMPILE_OPTIONS: &str = "SELECT compile_options FROM pragma_compile_options ORDER BY compile_options;";

/// Database-level statistics.
pub fn stats(detailed: bool) -> Vec<SqlStatement> {
    let mut statements = vec![
        SqlStatement::query(DATABASE_SIZE),
        SqlStatement::query(ATTACHED),
        SqlStatement::query(OBJECTS),
    ];
    if detailed {
        statements.extend([
            SqlStatement::query(SETTINGS),
            SqlStatement::query(COMPILE_OPTIONS),
        ]);
    }
    statements
}

/// Statistics for one table.
pub fn table_stats(table: &str, detailed: bool) -> Vec<SqlStatement> {
    let name = LITE.quote_literal(table);
    let ident = LITE.quote_ident(table);

    let mut statements = vec![
        SqlStatement::query(format!("SELECT COUNT(*) AS row_count FROM {ident};")),
        SqlStatement::query(format!(
            "\
SELECT
    cid,
    name AS column_name,
    type AS data_type,
    CASE WHEN \"notnull\" = 1 THEN 'NOT NULL' ELSE 'NULL' END AS nullable,
    dflt_value AS column_default,
    CASE WHEN pk > 0 THEN 'PK' ELSE '' END AS is_primary_key
FROM pragma_table_info({name})
ORDER BY cid;"
        )),
        SqlStatement::query(format!(
            "\
SELECT
    name AS index_name,
    \"unique\" AS is_unique,
    origin,
    partial
FROM pragma_index_list({name})
ORDER BY name;"
        )),
    ];

    if detailed {
        statements.extend([
            SqlStatement::query(format!(
                "\
SELECT
    il.name AS index_name,
    ii.seqno,
    ii.name AS column_name
FROM pragma_index_list({name}) AS il, pragma_index_info(il.name) AS ii
ORDER BY il.name, ii.seqno;"
            )),
            SqlStatement::query(format!(
                "\
SELECT
    id,
    seq,
    \"table\" AS referenced_table,
    \"from\" AS column_name,
    \"to\" AS referenced_column,
    on_update,
    on_delete
FROM pragma_foreign_key_list({name})
ORDER BY id, seq;"
            )),
            SqlStatement::query(format!(
                "SELECT sql AS table_definition FROM sqlite_master WHERE type = 'table' AND name = {name};"
            )),
        ]);
    }

    statements
}

/// Indexes of every table, optionally for one table.
pub fn indexes(table: Option<&str>, detailed: bool) -> SqlStatement {
    let mut sql = String::from(
        "\
SELECT
    m.tbl_name AS table_name,
    il.name AS index_name,
    CASE
        WHEN il.origin = 'pk' THEN 'PRIMARY KEY'
        WHEN il.\"unique\" = 1 THEN 'UNIQUE'
        ELSE 'INDEX'
    END AS constraint_type,
    (SELECT group_concat(ii.name, ', ') FROM pragma_index_info(il.name) AS ii) AS column_names",
    );

    if detailed {
        sql.push_str(
            ",
    ix.sql AS index_definition,
    CASE WHEN il.partial = 1 THEN 'Yes' ELSE 'No' END AS is_partial,
    il.origin AS origin",
        );
    }

    sql.push_str(
        "
FROM sqlite_master AS m
JOIN pragma_index_list(m.name) AS il",
    );
    if detailed {
        sql.push_str(
            "
LEFT JOIN sqlite_master AS ix ON ix.type = 'index' AND ix.name = il.name",
        );
    }
    sql.push_str(
        "
WHERE m.type = 'table'",
    );
    if let Some(table) = table {
        sql.push_str(&format!(" AND m.tbl_name = {}", LITE.quote_literal(table)));
    }
    sql.push_str(
        "
ORDER BY m.tbl_name, il.name;",
    );

    SqlStatement::query(sql)
}

/// Views with or without their definitions.
pub fn views(view: Option<&str>, include_definition: bool) -> SqlStatement {
    let definition = if include_definition {
        "sql AS view_definition"
    } else {
        "'Definition not included' AS view_definition"
    };

    let mut sql = format!(
        "\
SELECT
    'main' AS schema_name,
    name AS view_name,
    {definition}
FROM sqlite_master
WHERE type = 'view'"
    );
    if let Some(view) = view {
        sql.push_str(&format!(" AND name = {}", LITE.quote_literal(view)));
    }
    sql.push_str(
        "
ORDER BY name;",
    );

    SqlStatement::query(sql)
}

/// Attached databases; `temp` counts as a system schema.
pub fn schemas(schema: Option<&str>, include_system_schemas: bool) -> SqlStatement {
    let mut sql = String::from("SELECT seq, name AS schema_name, file FROM pragma_database_list");

    let mut conditions = Vec::new();
    if !include_system_schemas {
        conditions.push("name <> 'temp'".to_string());
    }
    if let Some(schema) = schema {
        conditions.push(format!("name = {}", LITE.quote_literal(schema)));
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY seq;");

    SqlStatement::query(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_stats_quotes_both_ways() {
        let statements = table_stats("we\"ird'name", false);
        assert_eq!(
            statements[0].sql,
            "SELECT COUNT(*) AS row_count FROM \"we\"\"ird'name\";"
        );
        assert!(statements[1].sql.contains("pragma_table_info('we\"ird''name')"));
    }

    #[test]
    fn test_indexes_detailed_joins_definitions() {
        let sql = indexes(Some("orders"), true).sql;
        assert!(sql.contains("LEFT JOIN sqlite_master AS ix"));
        assert!(sql.contains("AND m.tbl_name = 'orders'"));
        assert!(!indexes(None, false).sql.contains("LEFT JOIN"));
    }

    #[test]
    fn test_schemas_hide_temp_by_default() {
        assert_eq!(
            schemas(None, false).sql,
            "SELECT seq, name AS schema_name, file FROM pragma_database_list WHERE name <> 'temp' ORDER BY seq;"
        );
        assert_eq!(
            schemas(Some("main"), true).sql,
            "SELECT seq, name AS schema_name, file FROM pragma_database_list WHERE name = 'main' ORDER BY seq;"
        );
    }

    #[test]
    fn test_views_filter() {
        let sql = views(Some("recent"), true).sql;
        assert!(sql.contains("sql AS view_definition"));
        assert!(sql.contains("AND name = 'recent'"));
    }
}
