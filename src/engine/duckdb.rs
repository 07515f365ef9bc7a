//! DuckDB engine adapter.
//!
//! DuckDB is an in-process engine with a synchronous API: execution either
//! returns a result or raises, and read results come back through an explicit
//! row cursor. The adapter drains the cursor into an in-memory snapshot
//! before reporting completion, and releases it exactly once (on drop). The
//! engine does no parameter substitution here; bindings are embedded into the
//! SQL text before execution.

use anyhow::{Result, anyhow};
use duckdb::Connection;
use std::sync::Mutex;

use super::{EngineConnection, is_select, substitute_placeholders};
use crate::outcome::StatementOutcome;
use crate::row::{ColumnInfo, Row, RowSet, Value};
use crate::types::{DatabaseConfig, EngineKind};
use async_trait::async_trait;

/// DuckDB connection opened from a [`DatabaseConfig`].
///
/// The database file is `<data_dir>/<name>.duckdb`, created on first open.
pub struct DuckDbEngine {
    connection: Mutex<Connection>,
}

impl std::fmt::Debug for DuckDbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbEngine")
            .field("connection", &"<Connection>")
            .finish()
    }
}

impl DuckDbEngine {
    /// Open the database file, creating it if missing.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let path = config.file_path("duckdb");

        let connection = smol::unblock(move || {
            Connection::open(&path).map_err(|e| anyhow!("failed to open DuckDB file: {}", e))
        })
        .await?;

        tracing::info!("opened DuckDB database");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Drain a read statement's cursor into a snapshot.
    fn run_select_sync(conn: &Connection, sql: &str) -> StatementOutcome {
        let result = (|| -> Result<RowSet, duckdb::Error> {
            let mut stmt = conn.prepare(sql)?;
            let columns = build_column_info(&stmt);
            let column_count = columns.len();

            let mut rows = Vec::new();
            let mut cursor = stmt.query([])?;
            while let Some(row) = cursor.next()? {
                rows.push(convert_row(row, column_count));
            }
            // cursor and statement released here, once

            Ok(RowSet::new(columns, rows))
        })();

        match result {
            Ok(rows) => StatementOutcome::with_rows(sql, rows),
            Err(e) => StatementOutcome::failed(sql, e),
        }
    }

    fn run_modification_sync(conn: &Connection, sql: &str) -> StatementOutcome {
        match conn.execute(sql, []) {
            Ok(_affected) => StatementOutcome::ok(sql),
            Err(e) => StatementOutcome::failed(sql, e),
        }
    }
}

#[async_trait]
impl EngineConnection for DuckDbEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::DuckDb
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> StatementOutcome {
        // No engine-side binding: parameters go into the text
        let sql = substitute_placeholders(sql, bindings);
        tracing::debug!("duckdb execute: {}", sql);

        let guard = match self.connection.lock() {
            Ok(guard) => guard,
            Err(_) => return StatementOutcome::failed(sql.as_str(), "connection lock poisoned"),
        };

        // DuckDB is synchronous; run inline while holding the lock
        if is_select(&sql) {
            Self::run_select_sync(&guard, &sql)
        } else {
            Self::run_modification_sync(&guard, &sql)
        }
    }

    async fn ping(&self) -> bool {
        let Ok(guard) = self.connection.lock() else {
            return false;
        };
        guard
            .prepare("SELECT 1")
            .and_then(|mut stmt| stmt.query([]).map(|_| ()))
            .is_ok()
    }
}

// Connection is not Sync; all access goes through the Mutex
unsafe impl Send for DuckDbEngine {}
unsafe impl Sync for DuckDbEngine {}

fn build_column_info(stmt: &duckdb::Statement<'_>) -> Vec<ColumnInfo> {
    let count = stmt.column_count();
    (0..count)
        .map(|i| {
            let name = stmt.column_name(i).map_or("?", |v| v).to_string();
            let type_name = format!("{:?}", stmt.column_type(i));
            ColumnInfo::new(name, type_name, i)
        })
        .collect()
}

fn convert_row(row: &duckdb::Row<'_>, column_count: usize) -> Row {
    let values = (0..column_count)
        .map(|i| match row.get_ref(i) {
            Ok(value_ref) => value_ref_to_value(value_ref),
            Err(_) => Value::Null,
        })
        .collect();
    Row::new(values)
}

/// Collapse a DuckDB value into [`Value`]. Exotic types (intervals, nested
/// lists, structs) are carried as their debug text.
fn value_ref_to_value(value_ref: duckdb::types::ValueRef<'_>) -> Value {
    use duckdb::types::ValueRef;

    match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::Int64(i as i64),
        ValueRef::SmallInt(i) => Value::Int64(i as i64),
        ValueRef::Int(i) => Value::Int64(i as i64),
        ValueRef::BigInt(i) => Value::Int64(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Value::Int64)
            .unwrap_or_else(|_| Value::Text(i.to_string())),
        ValueRef::UTinyInt(i) => Value::Int64(i as i64),
        ValueRef::USmallInt(i) => Value::Int64(i as i64),
        ValueRef::UInt(i) => Value::Int64(i as i64),
        ValueRef::UBigInt(i) => i64::try_from(i)
            .map(Value::Int64)
            .unwrap_or_else(|_| Value::Text(i.to_string())),
        ValueRef::Float(f) => Value::Float64(f as f64),
        ValueRef::Double(f) => Value::Float64(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).to_string()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
        other => Value::Text(format!("{:?}", other)),
    }
}
