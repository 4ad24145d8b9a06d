//! Free-form SQL classification.
//!
//! Decides whether caller-supplied SQL should be routed to the query executor
//! (rows come back) or the statement executor (rows are changed). This is a
//! case-insensitive prefix heuristic, not a parser.

use serde::{Deserialize, Serialize};

/// Leading keywords that mark a statement as a row-producing query.
const QUERY_KEYWORDS: [&str; 4] = ["SELECT", "SHOW", "DESCRIBE", "EXPLAIN"];

/// How a SQL statement is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// Produces rows.
    Query,
    /// Mutates data or schema; reports affected rows.
    Statement,
}

/// Classifies SQL text by its leading keyword.
pub struct SqlClassifier;

impl SqlClassifier {
    /// Classifies `sql`: text starting with SELECT/SHOW/DESCRIBE/EXPLAIN
    /// (any case, after leading whitespace) is a query, anything else a
    /// statement. No delimiter is required after the keyword.
    pub fn classify(sql: &str) -> StatementKind {
        let trimmed = sql.trim_start();
        let is_query = QUERY_KEYWORDS.iter().any(|kw| {
            trimmed
                .get(..kw.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(kw))
        });
        if is_query {
            StatementKind::Query
        } else {
            StatementKind::Statement
        }
    }

    /// Applies an explicit caller override, falling back to [`Self::classify`].
    pub fn resolve(sql: &str, is_query: Option<bool>) -> StatementKind {
        match is_query {
            Some(true) => StatementKind::Query,
            Some(false) => StatementKind::Statement,
            None => Self::classify(sql),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_keywords_are_case_insensitive() {
        for sql in [
            "SELECT * FROM users",
            "  select 1",
            "Show tables",
            "describe users",
            "EXPLAIN ANALYZE SELECT 1",
            "select(1)",
            "SELECT*FROM t",
            "SELECT\"name\" FROM t",
            "SELECT'a'",
            // prefix match, as in the tool contract
            "SELECTED",
        ] {
            assert_eq!(SqlClassifier::classify(sql), StatementKind::Query, "{sql}");
        }
    }

    #[test]
    fn test_everything_else_is_a_statement() {
        for sql in [
            "UPDATE t SET x=1",
            "INSERT INTO t VALUES (1)",
            "WITH x AS (SELECT 1) SELECT * FROM x",
            "",
            "SELEC",
            "-- comment\nSELECT 1",
        ] {
            assert_eq!(SqlClassifier::classify(sql), StatementKind::Statement, "{sql}");
        }
    }

    #[test]
    fn test_explicit_override_wins() {
        assert_eq!(
            SqlClassifier::resolve("UPDATE t SET x=1 RETURNING x", Some(true)),
            StatementKind::Query
        );
        assert_eq!(
            SqlClassifier::resolve("SELECT pg_reload_conf()", Some(false)),
            StatementKind::Statement
        );
    }
}
