//! Text rendering of execution results.

use common::models::query::QueryResult;
use serde_json::Value;

/// Renders rows as a markdown table followed by a `(N rows)` line.
pub fn query_result(result: &QueryResult) -> String {
    let mut out = String::new();

    if !result.columns.is_empty() {
        let header: Vec<String> = result.columns.iter().map(|c| escape(&c.name)).collect();
        out.push_str(&format!("| {} |\n", header.join(" | ")));
        out.push_str(&format!(
            "|{}\n",
            " --- |".repeat(result.columns.len())
        ));
        for row in &result.rows {
            let cells: Vec<String> = row.iter().map(cell).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out.push('\n');
    }

    out.push_str(&format!("({} rows)", result.row_count));
    out
}

/// Outcome line for a mutating statement.
pub fn statement_result(rows_affected: u64) -> String {
    format!("Statement executed successfully. Rows affected: {rows_affected}")
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => escape(s),
        other => escape(&other.to_string()),
    }
}

/// Keeps a value on one table row.
fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::query::ColumnInfo;
    use serde_json::json;

    fn column(name: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: "TEXT".to_string(),
        }
    }

    #[test]
    fn test_renders_markdown_table() {
        let result = QueryResult::new(
            vec![column("id"), column("status")],
            vec![
                vec![json!(1), json!("paid")],
                vec![json!(2), Value::Null],
            ],
        );
        assert_eq!(
            query_result(&result),
            "| id | status |\n| --- | --- |\n| 1 | paid |\n| 2 | NULL |\n\n(2 rows)"
        );
    }

    #[test]
    fn test_empty_result_keeps_header() {
        let result = QueryResult::new(vec![column("id")], vec![]);
        assert_eq!(query_result(&result), "| id |\n| --- |\n\n(0 rows)");
    }

    #[test]
    fn test_cells_stay_on_one_line() {
        let result = QueryResult::new(
            vec![column("definition")],
            vec![vec![json!("SELECT a\nFROM t WHERE x = 'a|b'")]],
        );
        assert!(query_result(&result).contains("| SELECT a FROM t WHERE x = 'a\\|b' |"));
    }

    #[test]
    fn test_statement_line() {
        assert_eq!(
            statement_result(3),
            "Statement executed successfully. Rows affected: 3"
        );
    }
}
