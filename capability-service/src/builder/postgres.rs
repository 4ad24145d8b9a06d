//! PostgreSQL catalog queries.
//!
//! Describe queries are limited to the `public` schema unless the capability
//! is about schemas themselves.

use super::SqlStatement;
use crate::dialect::Dialect;

const PG: Dialect = Dialect::Postgres;

const DATABASE_SIZE: &str =
    "SELECT pg_size_pretty(pg_database_size(current_database())) AS database_size;";

const CONNECTIONS: &str = "\
SELECT
    count(*) AS total_connections,
    sum(CASE WHEN state = 'active' THEN 1 ELSE 0 END) AS active_connections,
    sum(CASE WHEN state = 'idle' THEN 1 ELSE 0 END) AS idle_connections
FROM pg_stat_activity;";

const LARGEST_TABLES: &str = "\
SELECT
    schemaname,
    relname AS table_name,
    pg_size_pretty(pg_total_relation_size(relid)) AS total_size,
    pg_size_pretty(pg_relation_size(relid)) AS table_size,
    pg_size_pretty(pg_total_relation_size(relid) - pg_relation_size(relid)) AS index_size,
    n_live_tup AS row_count
FROM pg_stat_user_tables
ORDER BY pg_total_relation_size(relid) DESC
LIMIT 10;";

const INDEX_USAGE: &str = "\
SELECT
    schemaname,
    relname AS table_name,
    indexrelname AS index_name,
    idx_scan AS index_scans,
    idx_tup_read AS tuples_read,
    idx_tup_fetch AS tuples_fetched
FROM pg_stat_user_indexes
ORDER BY idx_scan DESC
LIMIT 10;";

// needs the pg_buffercache extension; reported inline when it is missing
const BUFFER_CACHE: &str = "\
SELECT
    c.relname AS table_name,
    pg_size_pretty(count(*) * 8192) AS buffer_size,
    round(100.0 * count(*) / (SELECT setting::integer FROM pg_settings WHERE name = 'shared_buffers'), 2) AS buffer_percent
FROM pg_class c
INNER JOIN pg_buffercache b ON b.relfilenode = c.relfilenode
INNER JOIN pg_database d ON (b.reldatabase = d.oid AND d.datname = current_database())
WHERE c.relkind IN ('r', 't', 'm')
GROUP BY c.relname
ORDER BY count(*) DESC
LIMIT 10;";

const DATABASE_IO: &str = "\
SELECT
    datname,
    xact_commit AS commits,
    xact_rollback AS rollbacks,
    blks_read,
    blks_hit,
    tup_returned,
    tup_fetched,
    tup_inserted,
    tup_updated,
    tup_deleted
FROM pg_stat_database
WHERE datname = current_database();";

/// Database-level statistics.
pub fn stats(detailed: bool) -> Vec<SqlStatement> {
    let mut statements = vec![
        SqlStatement::query(DATABASE_SIZE),
        SqlStatement::query(CONNECTIONS),
        SqlStatement::query(LARGEST_TABLES),
    ];
    if detailed {
        statements.extend([
            SqlStatement::query(INDEX_USAGE),
            SqlStatement::query(BUFFER_CACHE),
            SqlStatement::query(DATABASE_IO),
        ]);
    }
    statements
}

/// Statistics for one table.
pub fn table_stats(table: &str, detailed: bool) -> Vec<SqlStatement> {
    let name = PG.quote_literal(table);

    let mut statements = vec![
        SqlStatement::query(format!(
            "\
SELECT
    pg_size_pretty(pg_total_relation_size(relid)) AS total_size,
    pg_size_pretty(pg_relation_size(relid)) AS table_size,
    pg_size_pretty(pg_total_relation_size(relid) - pg_relation_size(relid)) AS index_size,
    n_live_tup AS row_count,
    n_dead_tup AS dead_tuples
FROM pg_stat_user_tables
WHERE relname = {name};"
        )),
        SqlStatement::query(format!(
            "\
SELECT
    a.attname AS column_name,
    pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
    CASE WHEN a.attnotnull THEN 'NOT NULL' ELSE 'NULL' END AS nullable,
    CASE WHEN EXISTS (
        SELECT 1 FROM pg_constraint
        WHERE conrelid = a.attrelid
        AND a.attnum = ANY (conkey)
        AND contype = 'p'
    ) THEN 'PK' ELSE '' END AS is_primary_key
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON a.attrelid = c.oid
JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
WHERE c.relname = {name}
AND a.attnum > 0
AND NOT a.attisdropped
AND n.nspname = 'public'
ORDER BY a.attnum;"
        )),
        SqlStatement::query(format!(
            "\
SELECT
    i.relname AS index_name,
    pg_size_pretty(pg_relation_size(i.oid)) AS index_size,
    ui.idx_scan AS index_scans,
    ui.idx_tup_read AS tuples_read,
    ui.idx_tup_fetch AS tuples_fetched,
    a.amname AS index_type,
    array_to_string(array_agg(pg_catalog.pg_get_indexdef(idx.indexrelid, k + 1, true) ORDER BY k), ', ') AS column_names
FROM pg_stat_user_indexes ui
JOIN pg_index idx ON ui.indexrelid = idx.indexrelid
JOIN pg_class i ON idx.indexrelid = i.oid
JOIN pg_class c ON idx.indrelid = c.oid
JOIN pg_am a ON i.relam = a.oid
JOIN pg_namespace n ON c.relnamespace = n.oid,
generate_series(0, idx.indnkeyatts - 1) AS k
WHERE c.relname = {name}
AND n.nspname = 'public'
GROUP BY i.relname, i.oid, ui.idx_scan, ui.idx_tup_read, ui.idx_tup_fetch, a.amname
ORDER BY i.relname;"
        )),
    ];

    if detailed {
        statements.push(SqlStatement::query(format!(
            "\
SELECT
    seq_scan AS sequential_scans,
    seq_tup_read AS sequential_tuples_read,
    idx_scan AS index_scans,
    idx_tup_fetch AS index_tuples_fetched,
    n_tup_ins AS tuples_inserted,
    n_tup_upd AS tuples_updated,
    n_tup_del AS tuples_deleted,
    n_tup_hot_upd AS hot_updates,
    n_live_tup AS live_tuples,
    n_dead_tup AS dead_tuples,
    vacuum_count,
    autovacuum_count,
    analyze_count,
    autoanalyze_count
FROM pg_stat_user_tables
WHERE relname = {name};"
        )));
        statements.push(SqlStatement::query(bloat_estimate(&name)));
    }

    statements
}

/// Heap bloat estimate from `pg_stats` column widths.
fn bloat_estimate(name: &str) -> String {
    format!(
        "\
SELECT
    current_database() AS db, schemaname, tblname,
    bs * tblpages AS real_size,
    (tblpages - est_tblpages) * bs AS extra_size,
    CASE WHEN tblpages > 0
        THEN 100 * (tblpages - est_tblpages) / tblpages::float
        ELSE 0
    END AS extra_ratio,
    fillfactor,
    CASE WHEN tblpages > 0 AND tblpages - est_tblpages > 0
        THEN pg_size_pretty((bs * (tblpages - est_tblpages))::bigint)
        ELSE ''
    END AS bloat_size_pretty,
    is_na
FROM (
    SELECT
        ceil(reltuples / ((bs - page_hdr) / tpl_size)) + ceil(toasttuples / 4) AS est_tblpages,
        tblpages, fillfactor, bs, schemaname, tblname, is_na
    FROM (
        SELECT
            (4 + tpl_hdr_size + tpl_data_size + (2 * ma)
                - CASE WHEN tpl_hdr_size % ma = 0 THEN ma ELSE tpl_hdr_size % ma END
                - CASE WHEN ceil(tpl_data_size)::int % ma = 0 THEN ma ELSE ceil(tpl_data_size)::int % ma END
            ) AS tpl_size,
            (heappages + toastpages) AS tblpages,
            reltuples, toasttuples, bs, page_hdr, schemaname, tblname, fillfactor, is_na
        FROM (
            SELECT
                ns.nspname AS schemaname, tbl.relname AS tblname, tbl.reltuples,
                tbl.relpages AS heappages, coalesce(toast.relpages, 0) AS toastpages,
                coalesce(toast.reltuples, 0) AS toasttuples,
                coalesce(substring(array_to_string(tbl.reloptions, ' ') FROM 'fillfactor=([0-9]+)')::smallint, 100) AS fillfactor,
                current_setting('block_size')::numeric AS bs,
                CASE WHEN version() ~ 'mingw32' OR version() ~ '64-bit|x86_64|ppc64|ia64|amd64' THEN 8 ELSE 4 END AS ma,
                24 AS page_hdr,
                23 + CASE WHEN MAX(coalesce(s.null_frac, 0)) > 0 THEN (7 + count(*)) / 8 ELSE 0::int END AS tpl_hdr_size,
                sum((1 - coalesce(s.null_frac, 0)) * coalesce(s.avg_width, 1024)) AS tpl_data_size,
                bool_or(att.atttypid = 'pg_catalog.name'::regtype) AS is_na
            FROM pg_attribute AS att
            JOIN pg_class AS tbl ON att.attrelid = tbl.oid
            JOIN pg_namespace AS ns ON ns.oid = tbl.relnamespace
            LEFT JOIN pg_stats AS s ON s.schemaname = ns.nspname
                AND s.tablename = tbl.relname AND s.inherited = false AND s.attname = att.attname
            LEFT JOIN pg_class AS toast ON tbl.reltoastrelid = toast.oid
            WHERE NOT att.attisdropped
            AND att.attnum > 0
            AND tbl.relkind = 'r'
            AND ns.nspname = 'public'
            AND tbl.relname = {name}
            GROUP BY 1, 2, 3, 4, 5, 6, 7, 8, 9
        ) AS s
    ) AS s2
) AS s3;"
    )
}

/// Indexes of the `public` schema, optionally for one table.
pub fn indexes(table: Option<&str>, detailed: bool) -> SqlStatement {
    let mut sql = String::from(
        "\
SELECT
    t.relname AS table_name,
    i.relname AS index_name,
    a.amname AS index_type,
    CASE
        WHEN ix.indisprimary THEN 'PRIMARY KEY'
        WHEN ix.indisunique THEN 'UNIQUE'
        ELSE 'INDEX'
    END AS constraint_type,
    array_to_string(array_agg(pg_get_indexdef(ix.indexrelid, k + 1, true) ORDER BY k), ', ') AS column_names",
    );

    if detailed {
        sql.push_str(
            ",
    pg_size_pretty(pg_relation_size(i.oid)) AS index_size,
    pg_get_indexdef(ix.indexrelid) AS index_definition,
    CASE WHEN ix.indpred IS NOT NULL THEN 'Yes' ELSE 'No' END AS is_partial,
    CASE WHEN a.amname = 'btree' AND ix.indoption[0] & 1 = 1 THEN 'DESC' ELSE 'ASC' END AS sort_order",
        );
    }

    sql.push_str(
        "
FROM pg_index ix
JOIN pg_class i ON i.oid = ix.indexrelid
JOIN pg_class t ON t.oid = ix.indrelid
JOIN pg_namespace n ON n.oid = t.relnamespace
JOIN pg_am a ON a.oid = i.relam,
generate_series(0, ix.indnkeyatts - 1) AS k
WHERE n.nspname = 'public'",
    );

    if let Some(table) = table {
        sql.push_str(&format!(" AND t.relname = {}", PG.quote_literal(table)));
    }

    sql.push_str(
        "
GROUP BY t.relname, i.relname, a.amname, ix.indisprimary, ix.indisunique",
    );
    if detailed {
        sql.push_str(", i.oid, ix.indexrelid, ix.indpred, ix.indoption");
    }
    sql.push_str(
        "
ORDER BY t.relname, i.relname;",
    );

    SqlStatement::query(sql)
}

/// Constraints of the `public` schema.
///
/// Check constraints have no key columns, so the key-column join is a LEFT
/// JOIN and the definition comes from `pg_get_constraintdef`.
pub fn constraints(table: Option<&str>, constraint_type: Option<&str>) -> SqlStatement {
    let mut sql = String::from(
        "\
SELECT
    tc.table_schema,
    tc.table_name,
    tc.constraint_name,
    tc.constraint_type,
    CASE
        WHEN tc.constraint_type = 'FOREIGN KEY' THEN max(ccu.table_name::text)
        ELSE NULL
    END AS referenced_table,
    string_agg(DISTINCT kcu.column_name::text, ', ') AS column_names,
    CASE
        WHEN tc.constraint_type = 'FOREIGN KEY' THEN string_agg(DISTINCT ccu.column_name::text, ', ')
        ELSE NULL
    END AS referenced_columns,
    CASE
        WHEN tc.constraint_type IN ('CHECK', 'EXCLUSION') THEN pg_get_constraintdef(pgc.oid)
        ELSE NULL
    END AS constraint_definition
FROM information_schema.table_constraints tc
LEFT JOIN information_schema.key_column_usage kcu
    ON tc.constraint_name = kcu.constraint_name
    AND tc.table_schema = kcu.table_schema
LEFT JOIN information_schema.constraint_column_usage ccu
    ON ccu.constraint_name = tc.constraint_name
    AND ccu.table_schema = tc.table_schema
LEFT JOIN pg_namespace nsp
    ON nsp.nspname = tc.table_schema
LEFT JOIN pg_constraint pgc
    ON pgc.conname = tc.constraint_name
    AND pgc.connamespace = nsp.oid
WHERE tc.table_schema = 'public'",
    );

    if let Some(table) = table {
        sql.push_str(&format!(" AND tc.table_name = {}", PG.quote_literal(table)));
    }
    if let Some(kind) = constraint_type {
        sql.push_str(&format!(
            " AND tc.constraint_type = {}",
            PG.quote_literal(&kind.to_ascii_uppercase())
        ));
    }

    sql.push_str(
        "
GROUP BY tc.table_schema, tc.table_name, tc.constraint_name, tc.constraint_type, pgc.oid
ORDER BY tc.table_name, tc.constraint_name;",
    );

    SqlStatement::query(sql)
}

/// User views with or without their definitions.
pub fn views(view: Option<&str>, include_definition: bool) -> SqlStatement {
    let definition = if include_definition {
        "definition AS view_definition"
    } else {
        "'Definition not included' AS view_definition"
    };

    let mut sql = format!(
        "\
SELECT
    schemaname AS schema_name,
    viewname AS view_name,
    {definition}
FROM pg_catalog.pg_views
WHERE schemaname NOT IN ('pg_catalog', 'information_schema')"
    );

    if let Some(view) = view {
        sql.push_str(&format!(" AND viewname = {}", PG.quote_literal(view)));
    }
    sql.push_str(
        "
ORDER BY schemaname, viewname;",
    );

    SqlStatement::query(sql)
}

/// User-defined enum, composite, domain, range and base types.
///
/// Array types and the implicit row types of tables and views are skipped.
pub fn types(type_name: Option<&str>) -> SqlStatement {
    let mut sql = String::from(
        "\
SELECT
    n.nspname AS schema_name,
    t.typname AS type_name,
    CASE
        WHEN t.typtype = 'e' THEN 'ENUM'
        WHEN t.typtype = 'c' THEN 'COMPOSITE'
        WHEN t.typtype = 'd' THEN 'DOMAIN'
        WHEN t.typtype = 'r' THEN 'RANGE'
        WHEN t.typtype = 'b' THEN 'BASE'
        ELSE t.typtype::text
    END AS type_category,
    CASE
        WHEN t.typtype = 'e' THEN
            (SELECT string_agg(quote_literal(enumlabel), ', ' ORDER BY enumsortorder)
             FROM pg_enum
             WHERE enumtypid = t.oid)
        WHEN t.typtype = 'c' THEN
            (SELECT string_agg(attname || ' ' || format_type(atttypid, atttypmod), ', ' ORDER BY attnum)
             FROM pg_attribute
             WHERE attrelid = t.typrelid AND attnum > 0 AND NOT attisdropped)
        WHEN t.typtype = 'd' THEN
            format_type(t.typbasetype, t.typtypmod) ||
            CASE WHEN t.typnotnull THEN ' NOT NULL' ELSE '' END ||
            CASE WHEN t.typdefault IS NOT NULL THEN ' DEFAULT ' || t.typdefault ELSE '' END
        WHEN t.typtype = 'r' THEN
            (SELECT format_type(rngsubtype, NULL) FROM pg_range WHERE rngtypid = t.oid)
        ELSE format_type(t.oid, NULL)
    END AS type_definition,
    pg_catalog.obj_description(t.oid, 'pg_type') AS description
FROM pg_type t
JOIN pg_namespace n ON t.typnamespace = n.oid
WHERE t.typtype IN ('e', 'c', 'd', 'r', 'b')
AND (t.typrelid = 0 OR (SELECT c.relkind FROM pg_class c WHERE c.oid = t.typrelid) = 'c')
AND NOT EXISTS (SELECT 1 FROM pg_type el WHERE el.oid = t.typelem AND el.typarray = t.oid)
AND n.nspname NOT IN ('pg_catalog', 'information_schema')",
    );

    if let Some(name) = type_name {
        sql.push_str(&format!(" AND t.typname = {}", PG.quote_literal(name)));
    }
    sql.push_str(
        "
ORDER BY n.nspname, t.typname;",
    );

    SqlStatement::query(sql)
}

/// Schemas with owner, privileges and object counts.
pub fn schemas(schema: Option<&str>, include_system_schemas: bool) -> SqlStatement {
    let mut sql = String::from(
        "\
SELECT
    n.nspname AS schema_name,
    pg_catalog.pg_get_userbyid(n.nspowner) AS owner,
    pg_catalog.array_to_string(n.nspacl, E'\\n') AS access_privileges,
    pg_catalog.obj_description(n.oid, 'pg_namespace') AS description,
    (SELECT COUNT(*) FROM pg_catalog.pg_class c WHERE c.relnamespace = n.oid AND c.relkind = 'r') AS tables_count,
    (SELECT COUNT(*) FROM pg_catalog.pg_class c WHERE c.relnamespace = n.oid AND c.relkind = 'v') AS views_count,
    (SELECT COUNT(*) FROM pg_catalog.pg_proc p WHERE p.pronamespace = n.oid) AS functions_count
FROM pg_catalog.pg_namespace n",
    );

    let mut conditions = Vec::new();
    if !include_system_schemas {
        conditions.push(
            "n.nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast') \
             AND n.nspname NOT LIKE 'pg\\_temp\\_%' \
             AND n.nspname NOT LIKE 'pg\\_toast\\_temp\\_%'"
                .to_string(),
        );
    }
    if let Some(schema) = schema {
        conditions.push(format!("n.nspname = {}", PG.quote_literal(schema)));
    }
    if !conditions.is_empty() {
        sql.push_str("\nWHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    sql.push_str(
        "
ORDER BY n.nspname;",
    );

    SqlStatement::query(sql)
}
