//! MySQL / MariaDB catalog queries, scoped to the connection's current
//! database (`DATABASE()`).

use super::SqlStatement;
use crate::dialect::Dialect;

const MY: Dialect = Dialect::MySql;

/// Reply to `get_types`: MySQL has no user-defined types to list.
pub const TYPES_NOTICE: &str = "MySQL does not support custom data types in the same way as PostgreSQL. It only has built-in data types.";

const DATABASE_SIZE: &str = "\
SELECT
    table_schema AS database_name,
    ROUND(SUM(data_length + index_length) / 1024 / 1024, 2) AS size_mb
FROM information_schema.tables
WHERE table_schema = DATABASE()
GROUP BY table_schema;";

const CONNECTIONS: &str =
    "SHOW STATUS WHERE Variable_name IN ('Threads_connected', 'Threads_running', 'Max_used_connections');";

const LARGEST_TABLES: &str = "\
SELECT
    table_name,
    engine,
    table_rows,
    ROUND((data_length + index_length) / 1024 / 1024, 2) AS size_mb,
    ROUND(data_length / 1024 / 1024, 2) AS data_size_mb,
    ROUND(index_length / 1024 / 1024, 2) AS index_size_mb
FROM information_schema.tables
WHERE table_schema = DATABASE()
ORDER BY (data_length + index_length) DESC
LIMIT 10;";

const BUFFER_POOL: &str = "SHOW GLOBAL STATUS WHERE Variable_name LIKE 'Innodb_buffer_pool%';";

const QUERY_CACHE: &str = "SHOW GLOBAL STATUS WHERE Variable_name LIKE 'Qcache%';";

// userstat tables exist only on Percona Server and MariaDB
const TABLE_IO: &str = "\
SELECT
    table_schema,
    table_name,
    rows_read,
    rows_changed,
    rows_changed_x_indexes
FROM information_schema.table_statistics
WHERE table_schema = DATABASE()
ORDER BY rows_read DESC
LIMIT 10;";

const INDEX_IO: &str = "\
SELECT
    table_schema,
    table_name,
    index_name,
    rows_read
FROM information_schema.index_statistics
WHERE table_schema = DATABASE()
ORDER BY rows_read DESC
LIMIT 10;";

/// Database-level statistics.
pub fn stats(detailed: bool) -> Vec<SqlStatement> {
    let mut statements = vec![
        SqlStatement::query(DATABASE_SIZE),
        SqlStatement::query(CONNECTIONS),
        SqlStatement::query(LARGEST_TABLES),
    ];
    if detailed {
        statements.extend([
            SqlStatement::query(BUFFER_POOL),
            SqlStatement::query(QUERY_CACHE),
            SqlStatement::query(TABLE_IO),
            SqlStatement::query(INDEX_IO),
        ]);
    }
    statements
}

/// Statistics for one table.
pub fn table_stats(table: &str, detailed: bool) -> Vec<SqlStatement> {
    let name = MY.quote_literal(table);

    let mut statements = vec![
        SqlStatement::query(format!(
            "\
SELECT
    table_name,
    engine,
    table_rows,
    avg_row_length,
    ROUND(data_length / 1024 / 1024, 2) AS data_size_mb,
    ROUND(index_length / 1024 / 1024, 2) AS index_size_mb,
    ROUND((data_length + index_length) / 1024 / 1024, 2) AS total_size_mb
FROM information_schema.tables
WHERE table_schema = DATABASE()
AND table_name = {name};"
        )),
        SqlStatement::query(format!(
            "\
SELECT
    column_name,
    column_type,
    is_nullable,
    column_key,
    column_default,
    extra
FROM information_schema.columns
WHERE table_schema = DATABASE()
AND table_name = {name}
ORDER BY ordinal_position;"
        )),
        SqlStatement::query(format!(
            "\
SELECT
    index_name,
    column_name,
    seq_in_index,
    non_unique,
    CASE
        WHEN index_type = 'FULLTEXT' THEN 'FULLTEXT'
        WHEN index_name = 'PRIMARY' THEN 'PRIMARY'
        WHEN non_unique = 0 THEN 'UNIQUE'
        ELSE 'INDEX'
    END AS index_type
FROM information_schema.statistics
WHERE table_schema = DATABASE()
AND table_name = {name}
ORDER BY index_name, seq_in_index;"
        )),
    ];

    if detailed {
        statements.extend([
            SqlStatement::query(format!("SHOW TABLE STATUS LIKE {name};")),
            SqlStatement::query(format!(
                "\
SELECT
    index_name,
    stat_name,
    stat_value,
    stat_description
FROM mysql.innodb_index_stats
WHERE database_name = DATABASE()
AND table_name = {name}
ORDER BY index_name, stat_name;"
            )),
            SqlStatement::query(format!(
                "\
SELECT
    table_schema,
    table_name,
    rows_read,
    rows_changed,
    rows_changed_x_indexes
FROM information_schema.table_statistics
WHERE table_schema = DATABASE()
AND table_name = {name};"
            )),
        ]);
    }

    statements
}

/// Indexes of the current database, optionally for one table.
pub fn indexes(table: Option<&str>, detailed: bool) -> SqlStatement {
    let mut sql = String::from(
        "\
SELECT
    table_name,
    index_name,
    GROUP_CONCAT(column_name ORDER BY seq_in_index) AS column_names,
    CASE
        WHEN index_name = 'PRIMARY' THEN 'PRIMARY KEY'
        WHEN non_unique = 0 THEN 'UNIQUE'
        ELSE 'INDEX'
    END AS constraint_type,
    index_type",
    );

    if detailed {
        sql.push_str(
            ",
    CASE WHEN index_name = 'PRIMARY' THEN 'YES' ELSE 'NO' END AS is_primary,
    CASE WHEN non_unique = 0 THEN 'YES' ELSE 'NO' END AS is_unique,
    CASE WHEN index_type = 'FULLTEXT' THEN 'YES' ELSE 'NO' END AS is_fulltext,
    CASE WHEN index_comment != '' THEN index_comment ELSE NULL END AS comment",
        );
    }

    sql.push_str(
        "
FROM information_schema.statistics
WHERE table_schema = DATABASE()",
    );
    if let Some(table) = table {
        sql.push_str(&format!(" AND table_name = {}", MY.quote_literal(table)));
    }

    sql.push_str(
        "
GROUP BY table_name, index_name, non_unique, index_type",
    );
    if detailed {
        sql.push_str(", index_comment");
    }
    sql.push_str(
        "
ORDER BY table_name, index_name;",
    );

    SqlStatement::query(sql)
}

/// Key constraints of the current database.
pub fn constraints(table: Option<&str>, constraint_type: Option<&str>) -> SqlStatement {
    let mut sql = String::from(
        "\
SELECT
    tc.table_schema,
    tc.table_name,
    tc.constraint_name,
    tc.constraint_type,
    GROUP_CONCAT(kcu.column_name ORDER BY kcu.ordinal_position) AS column_names,
    kcu.referenced_table_name AS referenced_table,
    GROUP_CONCAT(kcu.referenced_column_name ORDER BY kcu.ordinal_position) AS referenced_columns
FROM information_schema.table_constraints tc
LEFT JOIN information_schema.key_column_usage kcu
    ON tc.constraint_name = kcu.constraint_name
    AND tc.table_schema = kcu.table_schema
    AND tc.table_name = kcu.table_name
WHERE tc.table_schema = DATABASE()",
    );

    if let Some(table) = table {
        sql.push_str(&format!(" AND tc.table_name = {}", MY.quote_literal(table)));
    }
    if let Some(kind) = constraint_type {
        sql.push_str(&format!(
            " AND tc.constraint_type = {}",
            MY.quote_literal(&kind.to_ascii_uppercase())
        ));
    }

    sql.push_str(
        "
GROUP BY tc.table_schema, tc.table_name, tc.constraint_name, tc.constraint_type, kcu.referenced_table_name
ORDER BY tc.table_name, tc.constraint_name;",
    );

    SqlStatement::query(sql)
}

/// Views of the current database.
pub fn views(view: Option<&str>, include_definition: bool) -> SqlStatement {
    let definition = if include_definition {
        "view_definition"
    } else {
        "'Definition not included' AS view_definition"
    };

    let mut sql = format!(
        "\
SELECT
    table_schema AS schema_name,
    table_name AS view_name,
    {definition}
FROM information_schema.views
WHERE table_schema = DATABASE()"
    );
    if let Some(view) = view {
        sql.push_str(&format!(" AND table_name = {}", MY.quote_literal(view)));
    }
    sql.push_str(
        "
ORDER BY table_schema, table_name;",
    );

    SqlStatement::query(sql)
}

/// Schemas (databases) on the server with object counts.
pub fn schemas(schema: Option<&str>) -> SqlStatement {
    let mut sql = String::from(
        "\
SELECT
    schema_name,
    default_character_set_name AS character_set,
    default_collation_name AS collation,
    (SELECT COUNT(*) FROM information_schema.tables t WHERE t.table_schema = s.schema_name AND t.table_type = 'BASE TABLE') AS tables_count,
    (SELECT COUNT(*) FROM information_schema.tables t WHERE t.table_schema = s.schema_name AND t.table_type = 'VIEW') AS views_count,
    (SELECT COUNT(*) FROM information_schema.routines r WHERE r.routine_schema = s.schema_name) AS routines_count
FROM information_schema.schemata s",
    );
    if let Some(schema) = schema {
        sql.push_str(&format!(" WHERE schema_name = {}", MY.quote_literal(schema)));
    }
    sql.push_str(
        "
ORDER BY schema_name;",
    );

    SqlStatement::query(sql)
}
