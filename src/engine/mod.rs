//! Schema engine
//!
//! [`SchemaEngine`] runs the public operations against a live database.
//! Each operation opens one [`Session`], resolves the dialect from it, does
//! its work, and releases the connection when the session drops, whatever
//! the exit path.
//!
//! Every statement runs in its own transaction: auto-commit is turned off,
//! the statement is executed and committed, and any failure rolls back
//! before it is reported. A failed `setup` therefore leaves the statements
//! that already succeeded in place.

mod clear;
mod export;
mod setup;
mod uninstall;

pub use clear::ClearReport;
pub use export::ExportReport;
pub use setup::{SetupOptions, SetupReport};
pub use uninstall::{UninstallReport, UninstallSetupReport};

use crate::connection::{ConnectionConfig, Connector, SqlConnection};
use crate::dialect::Dialect;
use crate::error::{DbSetupError, Result, SqlError};
use crate::schema::TableSpec;
use crate::sql_log::LoggedConnection;
use crate::typemap::TypeMaps;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// One open connection with its resolved dialect
///
/// The connection is closed when the session is dropped.
pub struct Session {
    conn: Box<dyn SqlConnection>,
    dialect: Dialect,
}

impl Session {
    /// Connect, wrap with the statement log, and resolve the dialect
    pub fn open(connector: &dyn Connector, config: &ConnectionConfig) -> Result<Self> {
        let url = config.redacted_url();
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::acquire_connection_span(&url).entered();

        let conn = connector.connect(config)?;
        let conn = LoggedConnection::wrap(conn, &config.sql_log)?;
        let mut session = Session {
            conn,
            dialect: Dialect::Generic,
        };

        let product = session
            .conn
            .product_name()
            .map_err(|source| DbSetupError::Connection {
                url: url.clone(),
                source,
            })?;
        session.dialect = Dialect::resolve(&product);
        log::debug!(
            "Connected to {} as {} ({}, dialect {})",
            url,
            config.user.as_deref().unwrap_or("<default>"),
            product,
            session.dialect
        );
        Ok(session)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn connection(&mut self) -> &mut dyn SqlConnection {
        self.conn.as_mut()
    }

    /// Run one statement in its own transaction
    pub fn execute(&mut self, sql: &str) -> std::result::Result<u64, SqlError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::statement_span(sql).entered();

        log::debug!("Executing: {sql}");
        let previous = self.conn.auto_commit();
        self.conn.set_auto_commit(false)?;

        let result = self
            .conn
            .execute(sql)
            .and_then(|count| self.conn.commit().map(|()| count));

        if result.is_err() {
            if let Err(e) = self.conn.rollback() {
                log::warn!("Rollback after failed statement also failed: {e}");
            }
        }
        if let Err(e) = self.conn.set_auto_commit(previous) {
            log::warn!("Failed to restore auto-commit mode: {e}");
        }
        result
    }

    /// Run statements in order, stopping at the first failure
    pub fn execute_all(&mut self, statements: &[String]) -> std::result::Result<(), SqlError> {
        for sql in statements {
            self.execute(sql)?;
        }
        Ok(())
    }

    /// Run every statement, collecting the failures instead of stopping
    pub fn execute_each(&mut self, statements: &[String]) -> Vec<SqlError> {
        statements
            .iter()
            .filter_map(|sql| self.execute(sql).err())
            .collect()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.conn.close();
    }
}

/// Runs setup, clear, uninstall and export against one database
pub struct SchemaEngine<C> {
    connector: C,
    config: ConnectionConfig,
    types: TypeMaps,
}

impl<C: Connector> SchemaEngine<C> {
    pub fn new(connector: C, config: ConnectionConfig) -> Self {
        Self {
            connector,
            config,
            types: TypeMaps::new(),
        }
    }

    /// Use custom type mappings instead of the built-in ones
    pub fn with_type_maps(mut self, types: TypeMaps) -> Self {
        self.types = types;
        self
    }

    pub fn type_maps(&self) -> &TypeMaps {
        &self.types
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn open(&self) -> Result<Session> {
        Session::open(&self.connector, &self.config)
    }
}

/// Case-insensitive match against an optional table filter
fn selected(table: &TableSpec, filter: Option<&str>) -> bool {
    filter.map_or(true, |name| table.name.eq_ignore_ascii_case(name))
}
