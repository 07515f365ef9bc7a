//! Normalized outcome of one executed statement.
//!
//! Every engine adapter reports completion through a `StatementOutcome`,
//! regardless of how the underlying engine signals success and failure.
//! Read statements additionally carry a materialized [`RowSet`] snapshot.

use anyhow::{Result, anyhow};

use crate::row::{Row, RowSet};

/// The normalized outcome of one executed statement.
///
/// One outcome is constructed per statement and handed to exactly one caller;
/// it is immutable after construction. Row access (`rows`, `item`, `each`) is
/// only usable on outcomes produced by read statements. Using it on a write
/// outcome is a caller contract violation and fails with a descriptive error
/// rather than silently returning nothing.
#[derive(Debug, Clone, Default)]
pub struct StatementOutcome {
    success: bool,
    error: Option<String>,
    sql: String,
    rows: Option<RowSet>,
}

impl StatementOutcome {
    /// Successful outcome of a write statement.
    pub fn ok(sql: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            sql: sql.into(),
            rows: None,
        }
    }

    /// Successful outcome of a read statement, with its row snapshot.
    pub fn with_rows(sql: impl Into<String>, rows: RowSet) -> Self {
        Self {
            success: true,
            error: None,
            sql: sql.into(),
            rows: Some(rows),
        }
    }

    /// Failed outcome carrying the engine's error text.
    pub fn failed(sql: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            sql: sql.into(),
            rows: None,
        }
    }

    /// Outcome of an operation that intentionally ran no statement
    /// (schema init with manual table creation).
    pub fn skipped() -> Self {
        Self {
            success: true,
            error: None,
            sql: String::new(),
            rows: None,
        }
    }

    /// Whether the statement completed without error.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Error text, if the statement failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The executed statement text, for diagnostics.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Whether this outcome carries a row snapshot.
    pub fn is_read(&self) -> bool {
        self.rows.is_some()
    }

    /// Number of rows in the snapshot; 0 for write outcomes.
    pub fn row_count(&self) -> usize {
        self.rows.as_ref().map_or(0, RowSet::len)
    }

    /// The materialized row snapshot.
    ///
    /// # Errors
    ///
    /// Fails if this outcome was not produced by a SELECT statement.
    pub fn rows(&self) -> Result<&RowSet> {
        self.rows.as_ref().ok_or_else(|| {
            anyhow!("row access is only available on the outcome of a SELECT statement")
        })
    }

    /// The row at `index` in the snapshot.
    ///
    /// # Errors
    ///
    /// Fails if this is not a read outcome, or `index` is out of range.
    pub fn item(&self, index: usize) -> Result<&Row> {
        let rows = self.rows()?;
        rows.item(index)
            .ok_or_else(|| anyhow!("row index {} out of range (0..{})", index, rows.len()))
    }

    /// Visit every row of the snapshot in ascending index order.
    ///
    /// # Errors
    ///
    /// Fails if this is not a read outcome.
    pub fn each<F>(&self, visitor: F) -> Result<()>
    where
        F: FnMut(usize, &Row),
    {
        self.rows()?.each(visitor);
        Ok(())
    }
}
