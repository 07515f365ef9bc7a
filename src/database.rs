//! Database handle.
//!
//! The entry point of the crate: opening a [`Database`] resolves the
//! configured engine (or auto-detects one), and the resulting handle hands
//! out [`Schema`] objects for per-table work. The engine choice is made once
//! here and never revisited.

use std::sync::Arc;

use anyhow::Result;

use crate::detect::Detector;
use crate::engine::EngineConnection;
use crate::schema::Schema;
use crate::sql::Field;
use crate::types::{DatabaseConfig, EngineKind};

/// An opened database, bound to one resolved engine.
#[derive(Clone)]
pub struct Database {
    config: DatabaseConfig,
    kind: EngineKind,
    connection: Arc<dyn EngineConnection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.config.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Database {
    /// Open a database from a full config, resolving the engine.
    pub async fn with_config(config: DatabaseConfig) -> Result<Self> {
        let (kind, connection) = Detector::resolve(&config).await?;
        Ok(Self {
            config,
            kind,
            connection,
        })
    }

    /// Convenience open with the common descriptor fields spelled out.
    ///
    /// `kind` may be [`EngineKind::Auto`] to probe for an available engine.
    pub async fn create(
        name: &str,
        size: u64,
        kind: EngineKind,
        version: &str,
        comment: &str,
    ) -> Result<Self> {
        let config = DatabaseConfig::new(name)
            .with_size(size)
            .with_kind(kind)
            .with_version(version)
            .with_comment(comment);
        Self::with_config(config).await
    }

    /// The engine this database resolved to. Never [`EngineKind::Auto`].
    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The underlying connection, for raw statement execution.
    pub fn connection(&self) -> &Arc<dyn EngineConnection> {
        &self.connection
    }

    /// Build a table handle bound to this database's connection.
    ///
    /// With `create_manually` set, [`Schema::init`] skips table creation and
    /// the caller issues its own DDL.
    pub fn schema(
        &self,
        table: impl Into<String>,
        fields: Vec<Field>,
        create_manually: bool,
    ) -> Schema {
        Schema::new(
            table,
            Arc::clone(&self.connection),
            fields,
            create_manually,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rejects_empty_name() {
        smol::block_on(async {
            let result = Database::create("", 200_000, EngineKind::Auto, "1.0", "").await;
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_auto_open_resolves_concrete_kind() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let config = DatabaseConfig::new("appdata").with_data_dir(dir.path());

            let db = Database::with_config(config).await.unwrap();
            assert_ne!(db.kind(), EngineKind::Auto);
            assert_eq!(db.kind(), EngineKind::Sqlite);
            assert!(db.connection().ping().await);
        });
    }
}
