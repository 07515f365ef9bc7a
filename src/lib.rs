//! Uniform table/CRUD layer over whichever local SQL engine is available.
//!
//! `anysql` exposes a single API for creating tables and running CRUD-style
//! statements, and transparently dispatches to one of four storage engines:
//!
//! - **SQLite** via SQLx (async, every statement runs inside a transaction scope)
//! - **DuckDB** (synchronous in-process engine with an explicit row cursor)
//! - **PostgreSQL** via SQLx (async, server-based)
//! - **ClickHouse** over its HTTP interface
//!
//! The engine is chosen once, when a [`Database`] handle is created: either an
//! explicit [`EngineKind`], or [`EngineKind::Auto`] to probe the supported
//! engines in a fixed order and take the first one that opens. Every engine's
//! native success/error convention is normalized into a [`StatementOutcome`],
//! so callers never see a driver-specific error type cross the execute
//! boundary.
//!
//! # Example
//!
//! ```ignore
//! use anysql::{Database, DatabaseConfig, Field, FieldType, Value, WhereClause};
//!
//! let config = DatabaseConfig::new("notes");
//! let db = Database::with_config(config).await?;
//! let items = db.schema(
//!     "items",
//!     vec![
//!         Field::new("id", FieldType::Integer).primary_key(),
//!         Field::new("text", FieldType::Text),
//!     ],
//!     false,
//! );
//! items.init().await;
//! let row = vec![("id".to_string(), Value::Int64(1)), ("text".to_string(), "a".into())];
//! items.insert(&row, None).await;
//! assert_eq!(items.count(None).await, 1);
//! ```

pub mod database;
pub mod detect;
pub mod engine;
pub mod outcome;
pub mod row;
pub mod schema;
pub mod sql;
pub mod types;

// Re-export commonly used types
pub use database::Database;
pub use detect::{DETECTION_ORDER, Detector};
pub use engine::EngineConnection;
pub use outcome::StatementOutcome;
pub use row::{ColumnInfo, Row, RowSet, Value};
pub use schema::Schema;
pub use sql::{Conflict, Field, FieldType, OrderBy, QueryBuilder, RowData, WhereClause};
pub use types::{DatabaseConfig, EngineKind, ServerParams};
