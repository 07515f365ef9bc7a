//! Table schema handle.
//!
//! A [`Schema`] is the per-table work surface: it owns the table's field
//! definitions and a shared engine connection, and exposes the CRUD
//! operations as simple calls. Write operations report plain success flags;
//! reads and raw statements return the full normalized outcome so row data
//! stays reachable.

use std::sync::Arc;

use crate::engine::EngineConnection;
use crate::outcome::StatementOutcome;
use crate::row::Value;
use crate::sql::{Conflict, Field, OrderBy, QueryBuilder, RowData, WhereClause};

/// A handle to one table on an opened database.
#[derive(Clone)]
pub struct Schema {
    name: String,
    connection: Arc<dyn EngineConnection>,
    fields: Vec<Field>,
    create_manually: bool,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .field("create_manually", &self.create_manually)
            .finish()
    }
}

impl Schema {
    pub(crate) fn new(
        name: impl Into<String>,
        connection: Arc<dyn EngineConnection>,
        fields: Vec<Field>,
        create_manually: bool,
    ) -> Self {
        Self {
            name: name.into(),
            connection,
            fields,
            create_manually,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn builder(&self) -> QueryBuilder {
        QueryBuilder::new(&self.name)
    }

    /// Ensure the table exists.
    ///
    /// Issues `CREATE TABLE IF NOT EXISTS` from the field definitions, so
    /// calling it on an existing table succeeds. With manual creation the
    /// statement is skipped and a no-op outcome is returned.
    pub async fn init(&self) -> StatementOutcome {
        if self.create_manually {
            return StatementOutcome::skipped();
        }
        let sql = self.builder().create_table(&self.fields, true, false);
        self.connection.execute(&sql, &[]).await
    }

    /// Run a raw statement against this schema's connection.
    pub async fn execute(&self, sql: &str, bindings: &[Value]) -> StatementOutcome {
        self.connection.execute(sql, bindings).await
    }

    /// Read rows. An empty column list selects `*`.
    ///
    /// Returns the full outcome so callers can walk the snapshot with
    /// [`StatementOutcome::item`] and [`StatementOutcome::each`], or inspect
    /// the error on failure.
    pub async fn select(
        &self,
        columns: &[&str],
        filter: Option<&WhereClause>,
        limit: Option<u64>,
        order: Option<&OrderBy>,
    ) -> StatementOutcome {
        let sql = self.builder().select(columns, filter, limit, order);
        self.connection.execute(&sql, &[]).await
    }

    /// Insert one row. Returns whether the statement succeeded.
    pub async fn insert(&self, data: &RowData, on_conflict: Option<Conflict>) -> bool {
        let sql = self.builder().insert(data, on_conflict);
        let outcome = self.connection.execute(&sql, &[]).await;
        if let Some(error) = outcome.error() {
            tracing::warn!("insert into {} failed: {}", self.name, error);
        }
        outcome.success()
    }

    /// Update matching rows. Returns whether the statement succeeded.
    pub async fn update(
        &self,
        data: &RowData,
        filter: Option<&WhereClause>,
        on_conflict: Option<Conflict>,
    ) -> bool {
        let sql = self.builder().update(data, filter, on_conflict);
        let outcome = self.connection.execute(&sql, &[]).await;
        if let Some(error) = outcome.error() {
            tracing::warn!("update of {} failed: {}", self.name, error);
        }
        outcome.success()
    }

    /// Delete matching rows; no filter deletes everything. Returns whether
    /// the statement succeeded.
    pub async fn remove(&self, filter: Option<&WhereClause>) -> bool {
        let sql = self.builder().remove(filter);
        let outcome = self.connection.execute(&sql, &[]).await;
        if let Some(error) = outcome.error() {
            tracing::warn!("delete from {} failed: {}", self.name, error);
        }
        outcome.success()
    }

    /// Count matching rows, or -1 when the query fails.
    pub async fn count(&self, filter: Option<&WhereClause>) -> i64 {
        let sql = self.builder().count("*", filter);
        let outcome = self.connection.execute(&sql, &[]).await;
        if !outcome.success() {
            return -1;
        }
        outcome
            .rows()
            .ok()
            .and_then(|rows| rows.item(0))
            .and_then(|row| row.get(0))
            .and_then(Value::as_i64)
            .unwrap_or(-1)
    }

    /// Drop the table if it exists. Returns whether the statement succeeded.
    pub async fn drop_table(&self) -> bool {
        let sql = self.builder().drop_table(true);
        let outcome = self.connection.execute(&sql, &[]).await;
        if let Some(error) = outcome.error() {
            tracing::warn!("drop of {} failed: {}", self.name, error);
        }
        outcome.success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::sql::FieldType;
    use crate::types::{DatabaseConfig, EngineKind};

    fn note_fields() -> Vec<Field> {
        vec![
            Field::new("id", FieldType::Integer).primary_key(),
            Field::new("text", FieldType::Text).not_null(),
        ]
    }

    async fn open_db(kind: EngineKind, dir: &tempfile::TempDir) -> Database {
        let config = DatabaseConfig::new("notes")
            .with_kind(kind)
            .with_data_dir(dir.path());
        Database::with_config(config).await.unwrap()
    }

    async fn exercise_crud(db: &Database) {
        let items = db.schema("items", note_fields(), false);

        let outcome = items.init().await;
        assert!(outcome.success(), "init failed: {:?}", outcome.error());
        // init is idempotent
        assert!(items.init().await.success());

        let row: RowData = vec![
            ("id".to_string(), Value::Int64(1)),
            ("text".to_string(), Value::Text("first note".to_string())),
        ];
        assert!(items.insert(&row, None).await);
        assert_eq!(items.count(None).await, 1);

        let outcome = items
            .select(&["id", "text"], Some(&WhereClause::eq("id", 1)), None, None)
            .await;
        assert!(outcome.success());
        assert_eq!(outcome.row_count(), 1);
        assert_eq!(
            outcome.rows().unwrap().value(0, "text"),
            Some(&Value::Text("first note".to_string()))
        );

        let update: RowData = vec![("text".to_string(), Value::Text("edited".to_string()))];
        assert!(items.update(&update, Some(&WhereClause::eq("id", 1)), None).await);
        let outcome = items.select(&["text"], None, None, None).await;
        assert_eq!(
            outcome.rows().unwrap().value(0, "text"),
            Some(&Value::Text("edited".to_string()))
        );

        assert!(items.remove(Some(&WhereClause::eq("id", 1))).await);
        assert_eq!(items.count(None).await, 0);

        assert!(items.drop_table().await);
        // dropping a missing table still succeeds (IF EXISTS)
        assert!(items.drop_table().await);

        // the table is gone, so counting reports failure
        assert_eq!(items.count(None).await, -1);
    }

    #[test]
    fn test_crud_lifecycle_sqlite() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let db = open_db(EngineKind::Sqlite, &dir).await;
            exercise_crud(&db).await;
        });
    }

    #[test]
    fn test_crud_lifecycle_duckdb() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let db = open_db(EngineKind::DuckDb, &dir).await;
            exercise_crud(&db).await;
        });
    }

    #[test]
    fn test_manual_creation_skips_ddl() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let db = open_db(EngineKind::Sqlite, &dir).await;
            let items = db.schema("manual_items", note_fields(), true);

            let outcome = items.init().await;
            assert!(outcome.success());
            assert!(outcome.sql().is_empty());

            // no table was created
            assert_eq!(items.count(None).await, -1);

            let ddl = items.execute(
                "CREATE TABLE manual_items (id INTEGER PRIMARY KEY, text TEXT NOT NULL)",
                &[],
            );
            assert!(ddl.await.success());
            assert_eq!(items.count(None).await, 0);
        });
    }

    #[test]
    fn test_ordered_and_limited_select() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let db = open_db(EngineKind::Sqlite, &dir).await;
            let items = db.schema("ranked", note_fields(), false);
            assert!(items.init().await.success());

            for (id, text) in [(1, "low"), (2, "mid"), (3, "high")] {
                let row: RowData = vec![
                    ("id".to_string(), Value::Int64(id)),
                    ("text".to_string(), Value::Text(text.to_string())),
                ];
                assert!(items.insert(&row, None).await);
            }

            let outcome = items
                .select(&[], None, Some(2), Some(&OrderBy::desc("id")))
                .await;
            assert!(outcome.success());
            let rows = outcome.rows().unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows.value(0, "id"), Some(&Value::Int64(3)));
            assert_eq!(rows.value(1, "id"), Some(&Value::Int64(2)));
        });
    }

    #[test]
    fn test_insert_conflict_policy() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let db = open_db(EngineKind::Sqlite, &dir).await;
            let items = db.schema("unique_items", note_fields(), false);
            assert!(items.init().await.success());

            let row: RowData = vec![
                ("id".to_string(), Value::Int64(1)),
                ("text".to_string(), Value::Text("a".to_string())),
            ];
            assert!(items.insert(&row, None).await);
            // duplicate primary key: plain insert fails, OR IGNORE succeeds
            assert!(!items.insert(&row, None).await);
            assert!(items.insert(&row, Some(Conflict::Ignore)).await);
            assert_eq!(items.count(None).await, 1);
        });
    }
}
