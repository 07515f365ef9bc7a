//! ClickHouse engine adapter.
//!
//! Talks to ClickHouse over its HTTP interface. This is the handshake-first
//! convention: the connection must be confirmed with a probe query before any
//! statement is dispatched, and each statement is one request with two
//! distinct failure channels (transport errors and in-body `DB::Exception`
//! responses). Results come back in `JSONCompact` format, which carries
//! column metadata alongside the data. Bindings are embedded into the SQL
//! text; the HTTP interface does no parameter substitution.

use anyhow::{Result, anyhow};
use serde_json::Value as JsonValue;

use super::{EngineConnection, is_select, substitute_placeholders};
use crate::outcome::StatementOutcome;
use crate::row::{ColumnInfo, Row, RowSet, Value};
use crate::types::{DatabaseConfig, EngineKind};
use async_trait::async_trait;

/// ClickHouse connection opened from a [`DatabaseConfig`].
pub struct ClickHouseEngine {
    base_url: String,
    username: String,
    password: String,
    database: String,
}

impl std::fmt::Debug for ClickHouseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseEngine")
            .field("base_url", &self.base_url)
            .field("database", &self.database)
            .finish()
    }
}

impl ClickHouseEngine {
    /// Connect to the server and confirm it with a probe query.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let engine = Self {
            base_url: format!(
                "http://{}:{}",
                config.hostname(),
                config.port(EngineKind::ClickHouse)
            ),
            username: config
                .server
                .username
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            password: config.server.password.clone(),
            database: config
                .server
                .database
                .clone()
                .unwrap_or_else(|| "default".to_string()),
        };

        // Connect-then-execute: nothing runs until this probe succeeds
        engine.request("SELECT 1").await?;

        tracing::info!("opened ClickHouse database {}", engine.database);
        Ok(engine)
    }

    fn query_url(&self) -> String {
        format!(
            "{}/?database={}&user={}&password={}&default_format=JSONCompact",
            self.base_url,
            urlencoding::encode(&self.database),
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password)
        )
    }

    /// POST one statement and return the raw response body.
    ///
    /// Transport failures and in-body engine errors are both reported as
    /// errors here; `execute` folds them into the outcome.
    async fn request(&self, sql: &str) -> Result<String> {
        let url = self.query_url();
        let body = sql.to_string();

        let response = smol::unblock(move || {
            let response = smolhttp::Client::new(&url)
                .map_err(|e| anyhow!("failed to create HTTP client: {}", e))?
                .post()
                .headers(vec![(
                    "Content-Type".to_string(),
                    "text/plain".to_string(),
                )])
                .body(body.into_bytes())
                .send()
                .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

            Ok::<String, anyhow::Error>(response.text())
        })
        .await?;

        if response.contains("Code:") && response.contains("DB::Exception") {
            return Err(anyhow!("ClickHouse error: {}", response.trim()));
        }

        Ok(response)
    }

    async fn run_select(&self, sql: &str) -> StatementOutcome {
        let response = match self.request(sql).await {
            Ok(response) => response,
            Err(e) => return StatementOutcome::failed(sql, e),
        };

        match serde_json::from_str::<JsonValue>(&response) {
            Ok(json) => {
                let rows = parse_json_compact(&json);
                StatementOutcome::with_rows(sql, rows)
            }
            Err(e) => StatementOutcome::failed(sql, format!("failed to parse response: {}", e)),
        }
    }

    async fn run_modification(&self, sql: &str) -> StatementOutcome {
        match self.request(sql).await {
            Ok(_) => StatementOutcome::ok(sql),
            Err(e) => StatementOutcome::failed(sql, e),
        }
    }
}

#[async_trait]
impl EngineConnection for ClickHouseEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::ClickHouse
    }

    async fn execute(&self, sql: &str, bindings: &[Value]) -> StatementOutcome {
        let sql = substitute_placeholders(sql, bindings);
        tracing::debug!("clickhouse execute: {}", sql);
        if is_select(&sql) {
            self.run_select(&sql).await
        } else {
            self.run_modification(&sql).await
        }
    }

    async fn ping(&self) -> bool {
        self.request("SELECT 1").await.is_ok()
    }
}

/// Parse a `JSONCompact` response body into a snapshot.
fn parse_json_compact(json: &JsonValue) -> RowSet {
    let columns: Vec<ColumnInfo> = json
        .get("meta")
        .and_then(|m| m.as_array())
        .map(|meta| {
            meta.iter()
                .enumerate()
                .filter_map(|(idx, m)| {
                    let name = m.get("name")?.as_str()?.to_string();
                    let type_name = m.get("type")?.as_str()?.to_string();
                    Some(ColumnInfo::new(name, type_name, idx))
                })
                .collect()
        })
        .unwrap_or_default();

    let rows: Vec<Row> = json
        .get("data")
        .and_then(|d| d.as_array())
        .map(|data| {
            data.iter()
                .map(|row| {
                    let values = row
                        .as_array()
                        .map(|cells| {
                            cells
                                .iter()
                                .enumerate()
                                .map(|(idx, cell)| {
                                    let type_name = columns
                                        .get(idx)
                                        .map(|c| c.type_name.as_str())
                                        .unwrap_or("String");
                                    json_to_value(cell, type_name)
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    Row::new(values)
                })
                .collect()
        })
        .unwrap_or_default();

    RowSet::new(columns, rows)
}

/// Convert a JSON cell into [`Value`], guided by the column's declared type.
///
/// ClickHouse quotes 64-bit integers in its JSON formats by default, so
/// numeric strings are parsed when the column type says so.
fn json_to_value(json: &JsonValue, type_name: &str) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float64(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::String(s) => {
            if type_name.contains("Int") {
                s.parse::<i64>().map(Value::Int64).unwrap_or_else(|_| Value::Text(s.clone()))
            } else if type_name.contains("Float") {
                s.parse::<f64>()
                    .map(Value::Float64)
                    .unwrap_or_else(|_| Value::Text(s.clone()))
            } else {
                Value::Text(s.clone())
            }
        }
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_carries_credentials() {
        let engine = ClickHouseEngine {
            base_url: "http://localhost:8123".to_string(),
            username: "reader".to_string(),
            password: "p w".to_string(),
            database: "app".to_string(),
        };
        let url = engine.query_url();
        assert!(url.contains("database=app"));
        assert!(url.contains("user=reader"));
        assert!(url.contains("password=p%20w"));
        assert!(url.contains("default_format=JSONCompact"));
    }

    #[test]
    fn test_parse_json_compact() {
        let json = serde_json::json!({
            "meta": [
                {"name": "id", "type": "UInt64"},
                {"name": "name", "type": "String"}
            ],
            "data": [
                ["1", "Alice"],
                ["2", "Bob"]
            ],
            "rows": 2
        });

        let rows = parse_json_compact(&json);
        assert_eq!(rows.columns().len(), 2);
        assert_eq!(rows.columns()[0].name, "id");
        assert_eq!(rows.len(), 2);
        // quoted 64-bit integers are parsed back to integers
        assert_eq!(rows.value(0, "id"), Some(&Value::Int64(1)));
        assert_eq!(rows.value(1, "name"), Some(&Value::Text("Bob".to_string())));
    }

    #[test]
    fn test_json_to_value() {
        assert_eq!(json_to_value(&serde_json::json!(null), "String"), Value::Null);
        assert_eq!(json_to_value(&serde_json::json!(3), "Int32"), Value::Int64(3));
        assert_eq!(
            json_to_value(&serde_json::json!(2.5), "Float64"),
            Value::Float64(2.5)
        );
        assert_eq!(
            json_to_value(&serde_json::json!("42"), "UInt64"),
            Value::Int64(42)
        );
        assert_eq!(
            json_to_value(&serde_json::json!("plain"), "String"),
            Value::Text("plain".to_string())
        );
    }
}
