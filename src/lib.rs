//! # dbsetup
//!
//! Declarative, multi-dialect schema and seed-data provisioning.
//!
//! A schema is described once in an XML document (tables, columns,
//! constraints, indexes, views and seed rows). [`SchemaEngine`] turns that
//! description into dialect-specific DDL/DML and applies it to a live
//! database: `setup` creates and loads, `clear` empties, `uninstall` drops,
//! and `export` snapshots whatever is there.
//!
//! ```no_run
//! use dbsetup::{ConnectionConfig, SchemaDocument, SchemaEngine, SetupOptions};
//! use dbsetup::postgres::PostgresConnector;
//!
//! # fn main() -> dbsetup::Result<()> {
//! let document = SchemaDocument::from_path("db-schema.xml")?;
//! let engine = SchemaEngine::new(
//!     PostgresConnector,
//!     ConnectionConfig::new("postgresql://localhost:5432/rhq"),
//! );
//! engine.setup(&document, &SetupOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod data;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod schema;
pub mod sql_log;
pub mod typemap;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "tracing")]
pub mod tracing_helpers;

#[cfg(any(test, feature = "test-helpers"))]
#[doc(hidden)]
pub mod test_helpers;

pub use crate::config::DbSetupConfig;
pub use connection::{ColumnMetadata, ConnectionConfig, Connector, SqlConnection, SqlLogConfig, SqlLogLevel, SqlLogTarget};
pub use data::{DataRow, RowAction};
pub use dialect::Dialect;
pub use engine::{
    ClearReport, ExportReport, SchemaEngine, Session, SetupOptions, SetupReport, UninstallReport,
    UninstallSetupReport,
};
pub use error::{DbSetupError, Result, SqlError};
pub use schema::SchemaDocument;
pub use typemap::TypeMaps;
