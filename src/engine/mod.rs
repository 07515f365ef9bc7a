//! Engine adapters.
//!
//! One adapter per supported engine, all implementing [`EngineConnection`].
//! Each adapter knows how to open its engine and how to translate raw SQL
//! plus optional bound parameters into a normalized [`StatementOutcome`],
//! using that engine's native success/error signaling convention. Native
//! errors never cross the execute boundary.

pub mod clickhouse;
pub mod duckdb;
pub mod postgres;
pub mod sqlite;

pub use clickhouse::ClickHouseEngine;
pub use duckdb::DuckDbEngine;
pub use postgres::PostgresEngine;
pub use sqlite::SqliteEngine;

use async_trait::async_trait;

use crate::outcome::StatementOutcome;
use crate::row::Value;
use crate::types::EngineKind;

/// Capability interface over one opened engine connection.
///
/// An implementation is selected once, at detection time, and stored on the
/// `Database` handle; dispatch is never re-decided per statement.
#[async_trait]
pub trait EngineConnection: Send + Sync {
    /// The concrete engine behind this connection.
    fn kind(&self) -> EngineKind;

    /// Execute one statement and report its normalized outcome.
    ///
    /// `bindings` are positional parameters for `?` placeholders. Engines
    /// without native parameter binding receive them embedded into the SQL
    /// text by their adapter. Failures are reported through the outcome's
    /// error field; this method never panics across the boundary and never
    /// returns a driver error directly.
    async fn execute(&self, sql: &str, bindings: &[Value]) -> StatementOutcome;

    /// Lightweight health probe against the open connection.
    async fn ping(&self) -> bool;
}

/// Check whether the statement is a read (`SELECT ...` prefix, case-insensitive).
pub(crate) fn is_select(sql: &str) -> bool {
    let trimmed = sql.trim_start().as_bytes();
    trimmed.len() > 6
        && trimmed[..6].eq_ignore_ascii_case(b"select")
        && trimmed[6].is_ascii_whitespace()
}

/// Embed positional bindings into the SQL text, for engines without native
/// parameter substitution. Placeholders inside string literals are left alone.
pub(crate) fn substitute_placeholders(sql: &str, bindings: &[Value]) -> String {
    if bindings.is_empty() {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len());
    let mut next = bindings.iter();
    let mut in_string = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '?' if !in_string => match next.next() {
                Some(value) => out.push_str(&crate::sql::literal(value)),
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    out
}

/// Rewrite `?` placeholders to numbered `$1..$n` form for PostgreSQL.
pub(crate) fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0usize;
    let mut in_string = false;
    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '?' if !in_string => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_select() {
        assert!(is_select("SELECT * FROM items"));
        assert!(is_select("select id from items"));
        assert!(is_select("  SELECT 1 "));
        assert!(is_select("SeLeCt\t1"));

        assert!(!is_select("INSERT INTO items VALUES (1)"));
        assert!(!is_select("UPDATE items SET x = 1"));
        assert!(!is_select("CREATE TABLE items (id INTEGER)"));
        assert!(!is_select("select"));
        assert!(!is_select("selection of items"));
    }

    #[test]
    fn test_substitute_placeholders() {
        let sql = substitute_placeholders(
            "INSERT INTO t (a, b) VALUES (?, ?)",
            &[Value::Int64(1), Value::Text("x".to_string())],
        );
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES (1, 'x')");
    }

    #[test]
    fn test_substitute_skips_quoted_question_marks() {
        let sql = substitute_placeholders(
            "SELECT * FROM t WHERE a = '?' AND b = ?",
            &[Value::Int64(7)],
        );
        assert_eq!(sql, "SELECT * FROM t WHERE a = '?' AND b = 7");
    }

    #[test]
    fn test_substitute_leaves_unmatched_placeholders() {
        let sql = substitute_placeholders("VALUES (?, ?)", &[Value::Int64(1)]);
        assert_eq!(sql, "VALUES (1, ?)");
    }

    #[test]
    fn test_number_placeholders() {
        assert_eq!(
            number_placeholders("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = $1 AND b = $2"
        );
        assert_eq!(
            number_placeholders("SELECT '?' , ?"),
            "SELECT '?' , $1"
        );
    }
}
