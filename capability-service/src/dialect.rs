//! SQL dialects and their escaping rules.

use std::fmt;
use std::str::FromStr;

use common::errors::AppError;

/// Supported SQL database families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL: double-quoted identifiers.
    Postgres,
    /// MySQL / MariaDB: backtick-quoted identifiers.
    MySql,
    /// SQLite: double-quoted identifiers.
    Sqlite,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Postgres, Dialect::MySql, Dialect::Sqlite];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Default server port, if the dialect is networked.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Dialect::Postgres => Some(5432),
            Dialect::MySql => Some(3306),
            Dialect::Sqlite => None,
        }
    }

    fn identifier_quote(&self) -> char {
        match self {
            Dialect::Postgres | Dialect::Sqlite => '"',
            Dialect::MySql => '`',
        }
    }

    /// Quotes an identifier, doubling any embedded quote character.
    pub fn quote_ident(&self, name: &str) -> String {
        let q = self.identifier_quote();
        let mut out = String::with_capacity(name.len() + 2);
        out.push(q);
        for c in name.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// Quotes a string literal, doubling embedded single quotes.
    ///
    /// MySQL also treats `\` as an escape inside literals, so backslashes are
    /// doubled there first.
    pub fn quote_literal(&self, value: &str) -> String {
        match self {
            Dialect::MySql => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''")),
            Dialect::Postgres | Dialect::Sqlite => format!("'{}'", value.replace('\'', "''")),
        }
    }

    /// Function used for `ORDER BY` when sampling randomly.
    pub fn random_function(&self) -> &'static str {
        match self {
            Dialect::Postgres | Dialect::Sqlite => "RANDOM()",
            Dialect::MySql => "RAND()",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = AppError;

    /// Parses a configured database type. The error carries no capability;
    /// callers that know it re-wrap with [`AppError::unsupported`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(AppError::unsupported(other, "any capability")),
        }
    }
}
