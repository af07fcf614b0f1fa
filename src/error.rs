//! Error types for dbsetup
//!
//! Two layers: [`SqlError`] is what a live connection reports for a single
//! call, [`DbSetupError`] is what the public operations return.

use std::fmt;
use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DbSetupError>;

/// A vendor error reported by a [`SqlConnection`](crate::connection::SqlConnection) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlError {
    /// Vendor message text
    pub message: String,
    /// Five-character SQLSTATE, when the driver reports one
    pub sql_state: Option<String>,
    /// Vendor-specific numeric error code, when the driver reports one
    pub vendor_code: Option<i32>,
}

impl SqlError {
    /// Create an error carrying only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            vendor_code: None,
        }
    }

    /// Attach a SQLSTATE
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    /// Attach a vendor error code
    pub fn with_code(mut self, code: i32) -> Self {
        self.vendor_code = Some(code);
        self
    }
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        match (&self.sql_state, self.vendor_code) {
            (Some(state), Some(code)) => write!(f, " (SQLState={state}, ErrorCode={code})"),
            (Some(state), None) => write!(f, " (SQLState={state})"),
            (None, Some(code)) => write!(f, " (ErrorCode={code})"),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for SqlError {}

/// Errors returned by document loading, DDL generation and the engine operations
#[derive(Debug, thiserror::Error)]
pub enum DbSetupError {
    /// A document or export file could not be read or written
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XML itself is malformed
    #[error("Malformed XML in {source_name}: {message}")]
    Xml { source_name: String, message: String },

    /// The root element is not `<dbsetup>`
    #[error("{0} is not a valid dbsetup document")]
    NotDbSetupDocument(String),

    /// An element the document grammar does not know, at a level where it is not tolerated
    #[error("Unknown element <{element}> in {source_name}")]
    UnknownElement { element: String, source_name: String },

    /// A required attribute or child is missing from a structural element
    #[error("Element <{element}> is missing required '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// `<include>` with a relative path while reading from a stream
    #[error("Include paths cannot be relative when reading from a stream: {0}")]
    RelativeIncludeFromStream(String),

    /// `<include>` chain that leads back to a file already being read
    #[error("Include cycle detected at '{}'", .0.display())]
    IncludeCycle(PathBuf),

    /// Two tables whose names differ only in case, or not at all
    #[error("Table {name} is declared more than once in {source_name}")]
    DuplicateTable { name: String, source_name: String },

    /// Table or column identifier longer than the portable limit
    #[error("{kind} name '{name}' is longer than {limit} characters")]
    NameTooLong {
        kind: &'static str,
        name: String,
        limit: usize,
    },

    /// A size-sensitive native type declared without a size
    #[error("Column {table}.{column} of type {native_type} requires a size")]
    MissingSize {
        table: String,
        column: String,
        native_type: String,
    },

    /// Generated sequence/trigger names would exceed the identifier limit
    #[error("Column {table}.{column} cannot use a sequence default: table and column names together exceed {limit} characters")]
    SequenceNameTooLong {
        table: String,
        column: String,
        limit: usize,
    },

    /// `ondelete` given on a column that references nothing
    #[error("Column {table}.{column} declares ondelete without references")]
    OnDeleteWithoutReferences { table: String, column: String },

    /// A dialect name that is not one of the supported families
    #[error("Unknown dialect '{0}'")]
    UnknownDialect(String),

    /// The connector could not open a connection
    #[error("Failed to connect to '{url}': {source}")]
    Connection {
        url: String,
        #[source]
        source: SqlError,
    },

    /// A fatal statement failure, wrapped with the resource it was working on
    #[error("{resource} [{source}]")]
    Statement {
        resource: String,
        #[source]
        source: SqlError,
    },

    /// Every drop command for a table was attempted; these are the ones that failed
    #[error("Failed to drop {table}: {}", join_errors(.errors))]
    Drop { table: String, errors: Vec<SqlError> },

    /// A bare vendor error that did not need wrapping
    #[error(transparent)]
    Sql(#[from] SqlError),

    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A type map file could not be parsed
    #[error("Invalid type map '{}': {source}", path.display())]
    TypeMap {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl DbSetupError {
    /// Wrap a vendor error with a description of the resource being processed
    pub fn statement(resource: impl Into<String>, source: SqlError) -> Self {
        DbSetupError::Statement {
            resource: resource.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DbSetupError::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_errors(errors: &[SqlError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_error_display_with_state_and_code() {
        let err = SqlError::new("relation \"foo\" does not exist")
            .with_state("42P01")
            .with_code(7);
        assert_eq!(
            err.to_string(),
            "relation \"foo\" does not exist (SQLState=42P01, ErrorCode=7)"
        );
    }

    #[test]
    fn test_sql_error_display_message_only() {
        assert_eq!(SqlError::new("boom").to_string(), "boom");
    }

    #[test]
    fn test_statement_error_includes_resource_and_vendor_text() {
        let err = DbSetupError::statement("Failed to create table FOO", SqlError::new("syntax error"));
        let display = err.to_string();
        assert!(display.contains("Failed to create table FOO"));
        assert!(display.contains("syntax error"));
    }

    #[test]
    fn test_drop_error_lists_every_failure() {
        let err = DbSetupError::Drop {
            table: "FOO".to_string(),
            errors: vec![SqlError::new("first"), SqlError::new("second")],
        };
        let display = err.to_string();
        assert!(display.contains("first"));
        assert!(display.contains("second"));
    }
}
