//! Engine detection.
//!
//! Resolves a [`DatabaseConfig`] to one opened engine connection. An explicit
//! kind opens that engine and nothing else; [`EngineKind::Auto`] probes the
//! candidates in [`DETECTION_ORDER`] and settles on the first one that opens.
//! Only open failures are swallowed during the scan; configuration errors are
//! reported before any engine is tried.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};

use crate::engine::{
    ClickHouseEngine, DuckDbEngine, EngineConnection, PostgresEngine, SqliteEngine,
};
use crate::types::{DatabaseConfig, EngineKind};

/// Probe order for [`EngineKind::Auto`]: embedded engines first, servers last.
pub const DETECTION_ORDER: [EngineKind; 4] = [
    EngineKind::Sqlite,
    EngineKind::DuckDb,
    EngineKind::Postgres,
    EngineKind::ClickHouse,
];

/// Resolves configs to opened engine connections.
pub struct Detector;

impl Detector {
    /// Open the engine the config names, or scan for one on `Auto`.
    ///
    /// Returns the concrete kind that was opened alongside the connection;
    /// the result is never [`EngineKind::Auto`].
    pub async fn resolve(
        config: &DatabaseConfig,
    ) -> Result<(EngineKind, Arc<dyn EngineConnection>)> {
        config.validate().map_err(|e| anyhow!(e))?;

        match config.kind {
            EngineKind::Auto => Self::scan(config).await,
            kind => {
                let connection = Self::open(kind, config).await?;
                Ok((kind, connection))
            }
        }
    }

    /// Try each candidate in order, settling on the first successful open.
    async fn scan(config: &DatabaseConfig) -> Result<(EngineKind, Arc<dyn EngineConnection>)> {
        for kind in DETECTION_ORDER {
            match Self::open(kind, config).await {
                Ok(connection) => {
                    tracing::info!("detected {} for database {}", kind, config.name);
                    return Ok((kind, connection));
                }
                Err(e) => {
                    tracing::debug!("skipping {}: {}", kind, e);
                }
            }
        }
        bail!("no supported database engine is available")
    }

    async fn open(kind: EngineKind, config: &DatabaseConfig) -> Result<Arc<dyn EngineConnection>> {
        Ok(match kind {
            EngineKind::Sqlite => Arc::new(SqliteEngine::open(config).await?),
            EngineKind::DuckDb => Arc::new(DuckDbEngine::open(config).await?),
            EngineKind::Postgres => Arc::new(PostgresEngine::open(config).await?),
            EngineKind::ClickHouse => Arc::new(ClickHouseEngine::open(config).await?),
            EngineKind::Auto => bail!("auto is not an engine"),
        })
    }
}
