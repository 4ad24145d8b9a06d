//! Response aggregation.
//!
//! A [`Report`] is a heading followed by one section per executed statement,
//! kept in the order the builder emitted them. A failed statement becomes an
//! inline error section; nothing is reordered, merged or summarized.

use common::errors::AppError;
use common::models::database::DatabaseItem;

use crate::capability::CapabilityRequest;
use crate::dialect::Dialect;

/// Prefix of an inline error section.
pub const ERROR_MARKER: &str = "Error executing query:";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    Output(String),
    Failed { sql: String, error: String },
}

/// Ordered text report for one capability call.
#[derive(Debug, Clone, Default)]
pub struct Report {
    heading: Option<String>,
    sections: Vec<Section>,
}

impl Report {
    pub fn new(heading: Option<String>) -> Self {
        Self {
            heading,
            sections: Vec::new(),
        }
    }

    /// Appends a statement's rendered output.
    pub fn push_output(&mut self, text: impl Into<String>) {
        self.sections.push(Section::Output(text.into()));
    }

    /// Appends an inline error for the statement `sql`.
    pub fn push_failure(&mut self, sql: &str, error: &AppError) {
        self.sections.push(Section::Failed {
            sql: sql.to_string(),
            error: error.to_string(),
        });
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of inline error sections.
    pub fn failures(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| matches!(s, Section::Failed { .. }))
            .count()
    }

    /// Renders the heading and every section, each followed by a blank line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(heading) = &self.heading {
            out.push_str(heading);
            out.push_str("\n\n");
        }
        for section in &self.sections {
            match section {
                Section::Output(text) => out.push_str(text),
                Section::Failed { sql, error } => {
                    out.push_str(&format!("{ERROR_MARKER} {sql}\n{error}"))
                }
            }
            out.push_str("\n\n");
        }
        out.truncate(out.trim_end().len());
        out
    }
}

/// Heading for a capability's report; `None` for free-form SQL.
pub fn heading(request: &CapabilityRequest, dialect: Dialect) -> Option<String> {
    use CapabilityRequest as R;

    let heading = match request {
        R::ExecuteSql(_) | R::ListDatabases => return None,
        R::GetStats(p) => format!("# Database Statistics for {} ({})", p.database, dialect),
        R::GetTableStats(p) => format!("# Table Statistics for {}.{}", p.database, p.table),
        R::GetIndexes(p) => match p.table() {
            None => format!("# All Indexes in Database {}", p.database),
            Some(t) => format!("# Indexes for Table {} in Database {}", t, p.database),
        },
        R::GetConstraints(p) => match (p.table(), p.constraint_type()) {
            (None, None) => format!("# All Constraints in Database {}", p.database),
            (None, Some(k)) => format!("# {} Constraints in Database {}", k, p.database),
            (Some(t), None) => {
                format!("# All Constraints for Table {} in Database {}", t, p.database)
            }
            (Some(t), Some(k)) => {
                format!("# {} Constraints for Table {} in Database {}", k, t, p.database)
            }
        },
        R::GetViews(p) => match p.view() {
            None => format!("# All Views in Database {}", p.database),
            Some(v) => format!("# View Definition for {} in Database {}", v, p.database),
        },
        R::GetTypes(p) => match p.type_name() {
            None => format!("# All Custom Data Types in Database {}", p.database),
            Some(t) => format!(
                "# Custom Data Type Definition for {} in Database {}",
                t, p.database
            ),
        },
        R::GetSchemas(p) => match p.schema() {
            None => format!("# All Schemas in Database {}", p.database),
            Some(s) => format!("# Schema Information for {} in Database {}", s, p.database),
        },
        R::GetSampleData(p) => {
            format!("# Sample Data from Table {} in Database {}", p.table, p.database)
        }
        R::GetUniqueValues(p) => format!(
            "# Unique Values in Column {} of Table {} in Database {}",
            p.column, p.table, p.database
        ),
    };
    Some(heading)
}

/// The `list_databases` report.
pub fn database_table(items: &[DatabaseItem]) -> String {
    let mut out = String::from("Available databases:\n\n");
    out.push_str("| # | Database ID | Type | Host | Port | Database Name | Description |\n");
    out.push_str("|---|------------|------|------|------|--------------|-------------|\n");

    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            i + 1,
            item.id,
            item.db_type,
            item.host,
            item.port,
            item.name,
            item.description
        ));
    }

    if items.is_empty() {
        out.push_str("No databases configured.\n");
    }
    out
}
