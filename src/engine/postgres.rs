//! PostgreSQL engine adapter.
//!
//! Backed by SQLx's `PgPool`. This is the async connection-based convention:
//! opening performs an explicit connect handshake, and statements are only
//! dispatched against the confirmed connection. Placeholders are rewritten
//! from `?` to the engine's numbered `$n` form before binding.

use anyhow::Result;
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{Column as _, Executor as _, Row as _, TypeInfo as _, ValueRef as _};
use std::time::Duration;

use super::{EngineConnection, is_select, number_placeholders};
use crate::outcome::StatementOutcome;
use crate::row::{ColumnInfo, Row, RowSet, Value};
use crate::types::{DatabaseConfig, EngineKind};
use async_trait::async_trait;

/// PostgreSQL connection opened from a [`DatabaseConfig`].
///
/// Server location comes from the config's [`ServerParams`] overrides;
/// unset fields fall back to localhost:5432 and the `postgres` account, with
/// the configured database name as the target database.
///
/// [`ServerParams`]: crate::types::ServerParams
pub struct PostgresEngine {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresEngine")
            .field("pool", &"<PgPool>")
            .finish()
    }
}

impl PostgresEngine {
    /// Connect to the server and confirm the connection with a handshake.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(config.hostname())
            .port(config.port(EngineKind::Postgres))
            .username(config.server.username.as_deref().unwrap_or("postgres"))
            .database(config.server.database.as_deref().unwrap_or(&config.name));
        if !config.server.password.is_empty() {
            options = options.password(&config.server.password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(3)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        // Statements are only safe after the open is confirmed
        sqlx::query("SELECT 1").fetch_one(&pool).await?;

        tracing::info!("opened PostgreSQL database {}", config.name);
        Ok(Self { pool })
    }

    fn bind_all<'q>(
        sql: &'q str,
        bindings: &[Value],
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
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

    async fn run_select(&self, sql: &str, numbered: &str, bindings: &[Value]) -> StatementOutcome {
        match Self::bind_all(numbered, bindings).fetch_all(&self.pool).await {
            Ok(rows) => {
                // Zero-row results still carry their column list
                let columns = match rows.first() {
                    Some(row) => build_column_info(row),
                    None => self
                        .pool
                        .describe(numbered)
                        .await
                        .map(|d| describe_columns(&d))
                        .unwrap_or_default(),
                };
                let converted: Vec<Row> = rows.iter().map(convert_row).collect();
                StatementOutcome::with_rows(sql, RowSet::new(columns, converted))
            }
            Err(e) => StatementOutcome::failed(sql, e),
        }
    }

    async fn run_modification(
        &self,
        sql: &str,
        numbered: &str,
        bindings: &[Value],
    ) -> StatementOutcome {
        match Self::bind_all(numbered, bindings).execute(&self.pool).await {
            Ok(_result) => StatementOutcome::ok(sql),
            Err(e) => StatementOutcome::failed(sql, e),
        }
    }
}

#[async_trait]
impl EngineConnection for PostgresEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Postgres
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> StatementOutcome {
        tracing::debug!("postgres execute: {}", sql);
        let numbered = number_placeholders(sql);
        if is_select(sql) {
            self.run_select(sql, &numbered, bindings).await
        } else {
            self.run_modification(sql, &numbered, bindings).await
        }
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

fn describe_columns(describe: &sqlx::Describe<sqlx::Postgres>) -> Vec<ColumnInfo> {
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

fn build_column_info(row: &PgRow) -> Vec<ColumnInfo> {
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

fn convert_row(row: &PgRow) -> Row {
    let values = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let type_name = col.type_info().name().to_string();
            extract_value(row, idx, &type_name)
        })
        .collect();
    Row::new(values)
}

/// Decode one cell, collapsing PostgreSQL's type widths into [`Value`].
fn extract_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        _ => {}
    }

    match type_name {
        "BOOL" => row
            .try_get::<bool, _>(index)
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "INT2" | "SMALLINT" | "SMALLSERIAL" => row
            .try_get::<i16, _>(index)
            .map(|v| Value::Int64(v as i64))
            .unwrap_or(Value::Null),
        "INT4" | "INT" | "INTEGER" | "SERIAL" => row
            .try_get::<i32, _>(index)
            .map(|v| Value::Int64(v as i64))
            .unwrap_or(Value::Null),
        "INT8" | "BIGINT" | "BIGSERIAL" => row
            .try_get::<i64, _>(index)
            .map(Value::Int64)
            .unwrap_or(Value::Null),
        "FLOAT4" | "REAL" => row
            .try_get::<f32, _>(index)
            .map(|v| Value::Float64(v as f64))
            .unwrap_or(Value::Null),
        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<f64, _>(index)
            .map(Value::Float64)
            .unwrap_or(Value::Null),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
            .try_get::<String, _>(index)
            .map(Value::Text)
            .unwrap_or(Value::Null),
        "BYTEA" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => decode_unknown(row, index),
    }
}

fn decode_unknown(row: &PgRow, index: usize) -> Value {
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
    use crate::types::ServerParams;

    #[test]
    fn test_open_requires_reachable_server() {
        smol::block_on(async {
            // Explicit engine selection: the failure propagates, no fallback
            let config = DatabaseConfig::new("unreachable")
                .with_kind(EngineKind::Postgres)
                .with_server(ServerParams {
                    hostname: Some("127.0.0.1".to_string()),
                    port: Some(1),
                    ..Default::default()
                });

            let result = PostgresEngine::open(&config).await;
            assert!(result.is_err());
        });
    }
}
