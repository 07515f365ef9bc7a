//! Engine identifiers and database configuration.
//!
//! This module contains:
//! - `EngineKind` - Enum of supported storage engines, plus the auto wildcard
//! - `DatabaseConfig` - Unified configuration for a database handle
//! - `ServerParams` - Optional overrides for server-based engines

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Supported storage engines.
///
/// `Auto` is a wildcard: it asks the detector to probe the concrete engines
/// in a fixed order and settle on the first one that opens. A `Database`
/// handle never carries `Auto` after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Auto,
    Sqlite,
    DuckDb,
    Postgres,
    ClickHouse,
}

impl EngineKind {
    /// Get the display name for this engine.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Sqlite => "SQLite",
            Self::DuckDb => "DuckDB",
            Self::Postgres => "PostgreSQL",
            Self::ClickHouse => "ClickHouse",
        }
    }

    /// Get the default port for server-based engines.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Postgres => Some(5432),
            Self::ClickHouse => Some(8123), // HTTP port
            _ => None,
        }
    }

    /// Check if this engine stores its data in a local file.
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::Sqlite | Self::DuckDb)
    }

    /// Parse from a string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "duckdb" | "duck" => Some(Self::DuckDb),
            "postgresql" | "postgres" | "pg" => Some(Self::Postgres),
            "clickhouse" | "ch" => Some(Self::ClickHouse),
            _ => None,
        }
    }

    /// Convert to a string representation for storage.
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Sqlite => "sqlite",
            Self::DuckDb => "duckdb",
            Self::Postgres => "postgres",
            Self::ClickHouse => "clickhouse",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Overrides for server-based engines (PostgreSQL, ClickHouse).
///
/// File-based engines ignore these entirely. Fields left unset fall back to
/// engine defaults: localhost, the engine's default port, and the engine's
/// conventional superuser account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerParams {
    /// Server hostname or IP address
    #[serde(default)]
    pub hostname: Option<String>,
    /// Server port
    #[serde(default)]
    pub port: Option<u16>,
    /// Username for authentication
    #[serde(default)]
    pub username: Option<String>,
    /// Password for authentication
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Database/schema to connect to; defaults to the configured name
    #[serde(default)]
    pub database: Option<String>,
}

fn default_size() -> u64 {
    200_000
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_comment() -> String {
    "Uncommented database generated by anysql".to_string()
}

/// Unified configuration for a database handle.
///
/// `name` identifies the storage unit: the file stem for file-based engines,
/// the database name for server-based ones. `size` is a quota byte budget
/// recorded for quota-enforcing engines; the engines supported here do not
/// enforce it, but it is carried for configuration round-trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database name or database file stem
    pub name: String,
    /// Size budget in bytes
    #[serde(default = "default_size")]
    pub size: u64,
    /// Requested engine; `Auto` probes the supported engines in order
    #[serde(default)]
    pub kind: EngineKind,
    /// Schema version string
    #[serde(default = "default_version")]
    pub version: String,
    /// Descriptive comment
    #[serde(default = "default_comment")]
    pub comment: String,
    /// Directory where file-based engines place their database files;
    /// defaults to the current directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Overrides for server-based engines
    #[serde(default)]
    pub server: ServerParams,
}

impl DatabaseConfig {
    /// Create a configuration with defaults for everything but the name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: default_size(),
            kind: EngineKind::default(),
            version: default_version(),
            comment: default_comment(),
            data_dir: None,
            server: ServerParams::default(),
        }
    }

    /// Set the requested engine.
    pub fn with_kind(mut self, kind: EngineKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the size budget.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Set the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the descriptive comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the directory for file-based engine data.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set server overrides for server-based engines.
    pub fn with_server(mut self, server: ServerParams) -> Self {
        self.server = server;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("database name is required".to_string());
        }
        Ok(())
    }

    /// Path for a file-based engine's database file.
    pub fn file_path(&self, extension: &str) -> PathBuf {
        let dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(format!("{}.{}", self.name, extension))
    }

    /// Hostname for server-based engines.
    pub fn hostname(&self) -> &str {
        self.server.hostname.as_deref().unwrap_or("localhost")
    }

    /// Port for the given server-based engine.
    pub fn port(&self, kind: EngineKind) -> u16 {
        self.server
            .port
            .or_else(|| kind.default_port())
            .unwrap_or(0)
    }
}
