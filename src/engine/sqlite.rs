//! SQLite engine adapter.
//!
//! Backed by SQLx's `SqlitePool`. This is the transaction-style convention:
//! every statement runs inside its own transaction scope, and bound
//! parameters are passed positionally for the engine to substitute.

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as _, Executor as _, Row as _, TypeInfo as _, ValueRef as _};
use std::time::Duration;

use super::{EngineConnection, is_select};
use crate::outcome::StatementOutcome;
use crate::row::{ColumnInfo, Row, RowSet, Value};
use crate::types::{DatabaseConfig, EngineKind};
use async_trait::async_trait;

/// SQLite connection opened from a [`DatabaseConfig`].
///
/// The database file is `<data_dir>/<name>.sqlite`, created on first open.
pub struct SqliteEngine {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEngine")
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl SqliteEngine {
    /// Open the database file, creating it if missing.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let path = config.file_path("sqlite");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Small pool: SQLite is single-writer
        let pool = SqlitePoolOptions::new()
            .max_connections(3)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        tracing::info!("opened SQLite database at {}", path.display());
        Ok(Self { pool })
    }

    fn bind_all<'q>(
        sql: &'q str,
        bindings: &[Value],
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
        let mut query = sqlx::query(sql);
        for value in bindings {
            query = match value {
                Value::Null => query.bind(Option::<i64>::None),
                Value::Bool(b) => query.bind(*b),
                Value::Int64(v) => query.bind(*v),
                Value::Float64(v) => query.bind(*v),
                Value::Text(s) => query.bind(s.clone()),
                Value::Bytes(b) => query.bind(b.clone()),
            };
        }
        query
    }

    async fn run_select(&self, sql: &str, bindings: &[Value]) -> StatementOutcome {
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => return StatementOutcome::failed(sql, e),
        };

        let rows = match Self::bind_all(sql, bindings).fetch_all(&mut *tx).await {
            Ok(rows) => rows,
            Err(e) => return StatementOutcome::failed(sql, e),
        };

        // Zero-row results still carry their column list
        let columns = match rows.first() {
            Some(row) => build_column_info(row),
            None => (&mut *tx)
                .describe(sql)
                .await
                .map(|d| describe_columns(&d))
                .unwrap_or_default(),
        };

        if let Err(e) = tx.commit().await {
            return StatementOutcome::failed(sql, e);
        }
        let converted: Vec<Row> = rows.iter().map(convert_row).collect();
        StatementOutcome::with_rows(sql, RowSet::new(columns, converted))
    }

    async fn run_modification(&self, sql: &str, bindings: &[Value]) -> StatementOutcome {
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => return StatementOutcome::failed(sql, e),
        };

        if let Err(e) = Self::bind_all(sql, bindings).execute(&mut *tx).await {
            return StatementOutcome::failed(sql, e);
        }

        match tx.commit().await {
            Ok(()) => StatementOutcome::ok(sql),
            Err(e) => StatementOutcome::failed(sql, e),
        }
    }
}

#[async_trait]
impl EngineConnection for SqliteEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Sqlite
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> StatementOutcome {
        tracing::debug!("sqlite execute: {}", sql);
        if is_select(sql) {
            self.run_select(sql, bindings).await
        } else {
            self.run_modification(sql, bindings).await
        }
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

fn describe_columns(describe: &sqlx::Describe<sqlx::Sqlite>) -> Vec<ColumnInfo> {
    describe
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            ColumnInfo::new(
                col.name().to_string(),
                col.type_info().name().to_string(),
                idx,
            )
        })
        .collect()
}

fn build_column_info(row: &SqliteRow) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            ColumnInfo::new(
                col.name().to_string(),
                col.type_info().name().to_string(),
                idx,
            )
        })
        .collect()
}

fn convert_row(row: &SqliteRow) -> Row {
    let values = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let type_name = col.type_info().name().to_uppercase();
            extract_value(row, idx, &type_name)
        })
        .collect();
    Row::new(values)
}

/// Decode one cell, collapsing SQLite's type affinities into [`Value`].
fn extract_value(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        _ => {}
    }

    match type_name {
        "INTEGER" | "INT" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "BIGINT" | "INT2" | "INT8" => {
            row.try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or(Value::Null)
        }
        "BOOLEAN" | "BOOL" => row
            .try_get::<bool, _>(index)
            .map(Value::Bool)
            .or_else(|_| row.try_get::<i64, _>(index).map(|v| Value::Bool(v != 0)))
            .unwrap_or(Value::Null),
        "REAL" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" | "NUMERIC" | "DECIMAL" => row
            .try_get::<f64, _>(index)
            .map(Value::Float64)
            .unwrap_or(Value::Null),
        "TEXT" | "VARCHAR" | "NVARCHAR" | "CLOB" | "CHARACTER" | "CHAR" => row
            .try_get::<String, _>(index)
            .map(Value::Text)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => decode_unknown(row, index),
    }
}

fn decode_unknown(row: &SqliteRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Value::Int64(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Value::Float64(v);
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Value::Text(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return Value::Bytes(v);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str) -> (tempfile::TempDir, DatabaseConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::new(name)
            .with_kind(EngineKind::Sqlite)
            .with_data_dir(dir.path());
        (dir, config)
    }

    #[test]
    fn test_open_creates_file() {
        smol::block_on(async {
            let (dir, config) = temp_config("open_test");
            let engine = SqliteEngine::open(&config).await.unwrap();
            assert_eq!(engine.kind(), EngineKind::Sqlite);
            assert!(engine.ping().await);
            assert!(dir.path().join("open_test.sqlite").exists());
        });
    }

    #[test]
    fn test_create_table_is_idempotent() {
        smol::block_on(async {
            let (_dir, config) = temp_config("ddl_test");
            let engine = SqliteEngine::open(&config).await.unwrap();

            let ddl = "CREATE TABLE IF NOT EXISTS items (id INTEGER PRIMARY KEY, text TEXT)";
            let first = engine.execute(ddl, &[]).await;
            assert!(first.success(), "first create failed: {:?}", first.error());

            let second = engine.execute(ddl, &[]).await;
            assert!(second.success(), "re-run failed: {:?}", second.error());
        });
    }

    #[test]
    fn test_select_materializes_rows() {
        smol::block_on(async {
            let (_dir, config) = temp_config("select_test");
            let engine = SqliteEngine::open(&config).await.unwrap();

            engine
                .execute("CREATE TABLE items (id INTEGER, text TEXT)", &[])
                .await;
            for (id, text) in [(1, "a"), (2, "b"), (3, "c")] {
                let outcome = engine
                    .execute(
                        "INSERT INTO items (id, text) VALUES (?, ?)",
                        &[Value::Int64(id), Value::Text(text.to_string())],
                    )
                    .await;
                assert!(outcome.success());
                // write outcomes expose no rows
                assert!(outcome.rows().is_err());
            }

            let outcome = engine
                .execute("SELECT id, text FROM items ORDER BY id", &[])
                .await;
            assert!(outcome.success());
            let rows = outcome.rows().unwrap();
            assert_eq!(rows.len(), 3);
            assert_eq!(rows.value(0, "text"), Some(&Value::Text("a".to_string())));
            assert_eq!(rows.value(2, "id"), Some(&Value::Int64(3)));

            let mut indices = Vec::new();
            rows.each(|i, _| indices.push(i));
            assert_eq!(indices, vec![0, 1, 2]);
        });
    }

    #[test]
    fn test_empty_select_keeps_column_metadata() {
        smol::block_on(async {
            let (_dir, config) = temp_config("empty_test");
            let engine = SqliteEngine::open(&config).await.unwrap();

            engine
                .execute("CREATE TABLE items (id INTEGER, text TEXT)", &[])
                .await;

            let outcome = engine.execute("SELECT id, text FROM items", &[]).await;
            assert!(outcome.success());
            let rows = outcome.rows().unwrap();
            assert_eq!(rows.len(), 0);
            assert_eq!(rows.columns().len(), 2);
            assert_eq!(rows.column_index("text"), Some(1));
        });
    }

    #[test]
    fn test_failed_statement_reports_error() {
        smol::block_on(async {
            let (_dir, config) = temp_config("error_test");
            let engine = SqliteEngine::open(&config).await.unwrap();

            let outcome = engine.execute("SELECT x FROM missing_table", &[]).await;
            assert!(!outcome.success());
            assert!(outcome.error().is_some());
            assert_eq!(outcome.sql(), "SELECT x FROM missing_table");
        });
    }

    #[test]
    fn test_positional_bindings() {
        smol::block_on(async {
            let (_dir, config) = temp_config("bind_test");
            let engine = SqliteEngine::open(&config).await.unwrap();

            engine
                .execute("CREATE TABLE kv (k TEXT, v INTEGER)", &[])
                .await;
            engine
                .execute(
                    "INSERT INTO kv (k, v) VALUES (?, ?)",
                    &[Value::Text("answer".to_string()), Value::Int64(42)],
                )
                .await;

            let outcome = engine
                .execute(
                    "SELECT v FROM kv WHERE k = ?",
                    &[Value::Text("answer".to_string())],
                )
                .await;
            assert!(outcome.success());
            assert_eq!(
                outcome.rows().unwrap().item(0).unwrap().get(0),
                Some(&Value::Int64(42))
            );
        });
    }
}
