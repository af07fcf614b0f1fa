//! Connection Module
//!
//! The engine never talks to a driver directly. It acquires a
//! [`SqlConnection`] from a [`Connector`] with an explicit
//! [`ConnectionConfig`], resolves the [`Dialect`](crate::dialect::Dialect)
//! from the product name the connection reports, and releases the
//! connection when the operation ends.

use crate::error::{Result, SqlError};
use std::path::PathBuf;

/// Column description returned by live metadata introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Column name as the database reports it
    pub name: String,
    /// Native type name as the database reports it
    pub type_name: String,
    /// Declared length or precision, 0 when the type has none
    pub size: usize,
    /// Whether the column accepts NULL
    pub nullable: bool,
}

/// A live database connection
///
/// Every method maps to one round trip (or one local state change) on the
/// underlying driver. Implementations report failures as [`SqlError`] so the
/// engine can decide per call whether a failure is fatal, recoverable, or
/// expected for the dialect.
pub trait SqlConnection {
    /// Product name and version string, used to resolve the dialect
    fn product_name(&mut self) -> std::result::Result<String, SqlError>;

    /// Execute one DDL/DML statement and return the affected row count
    fn execute(&mut self, sql: &str) -> std::result::Result<u64, SqlError>;

    /// Run a query and return every row as text values (`None` for NULL)
    fn query(&mut self, sql: &str) -> std::result::Result<Vec<Vec<Option<String>>>, SqlError>;

    /// Current auto-commit mode
    fn auto_commit(&self) -> bool;

    /// Switch auto-commit mode
    fn set_auto_commit(&mut self, enabled: bool) -> std::result::Result<(), SqlError>;

    /// Commit the current transaction
    fn commit(&mut self) -> std::result::Result<(), SqlError>;

    /// Roll back the current transaction
    fn rollback(&mut self) -> std::result::Result<(), SqlError>;

    /// Names of the user tables visible in `schema` (or the connection's default schema)
    fn table_names(&mut self, schema: Option<&str>) -> std::result::Result<Vec<String>, SqlError>;

    /// Columns of `table`, in ordinal order
    fn columns(
        &mut self,
        table: &str,
        schema: Option<&str>,
    ) -> std::result::Result<Vec<ColumnMetadata>, SqlError>;

    /// Release the connection. Must be safe to call more than once.
    fn close(&mut self);
}

/// Opens connections from a [`ConnectionConfig`]
pub trait Connector {
    /// Open a new connection
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn SqlConnection>>;
}

/// What the statement log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlLogLevel {
    /// Statement logging disabled
    #[default]
    None,
    /// Every connection call (execute, query, commit, rollback, metadata)
    All,
    /// Only calls that run SQL text
    Sql,
}

impl std::str::FromStr for SqlLogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(SqlLogLevel::None),
            "all" => Ok(SqlLogLevel::All),
            "sql" => Ok(SqlLogLevel::Sql),
            other => Err(format!("invalid log mode '{other}' (expected none, all or sql)")),
        }
    }
}

/// Where the statement log goes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SqlLogTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

/// Statement log settings, handed to the connection-acquisition call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SqlLogConfig {
    pub level: SqlLogLevel,
    pub target: SqlLogTarget,
}

impl SqlLogConfig {
    /// Statement logging disabled
    pub fn off() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.level != SqlLogLevel::None
    }
}

/// Everything needed to open a connection
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Database URL, either URI (`postgresql://host/db`) or key-value (`host=... dbname=...`)
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub sql_log: SqlLogConfig,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }

    pub fn with_sql_log(mut self, sql_log: SqlLogConfig) -> Self {
        self.sql_log = sql_log;
        self
    }

    /// Connection string with the configured credentials folded in
    ///
    /// Key-value strings get `user=`/`password=` pairs appended. URI strings
    /// get `user:password@` inserted after the scheme unless they already
    /// carry credentials.
    pub fn connection_string(&self) -> String {
        let Some(user) = self.user.as_deref().filter(|u| !u.is_empty()) else {
            return self.url.clone();
        };

        if let Some(scheme_end) = self.url.find("://") {
            let rest = &self.url[scheme_end + 3..];
            let authority = rest.split('/').next().unwrap_or_default();
            if authority.contains('@') {
                return self.url.clone();
            }
            let credentials = match self.password.as_deref() {
                Some(password) => format!("{user}:{password}@"),
                None => format!("{user}@"),
            };
            return format!("{}{}{}", &self.url[..scheme_end + 3], credentials, rest);
        }

        let mut conn = format!("{} user={}", self.url.trim_end(), user);
        if let Some(password) = self.password.as_deref() {
            conn.push_str(&format!(" password={password}"));
        }
        conn
    }

    /// The URL with any password masked, for logs and spans
    pub fn redacted_url(&self) -> String {
        if let Some(scheme_end) = self.url.find("://") {
            let rest = &self.url[scheme_end + 3..];
            let authority_end = rest.find('/').unwrap_or(rest.len());
            if let Some(at) = rest[..authority_end].rfind('@') {
                let user = rest[..at].split(':').next().unwrap_or_default();
                return format!("{}{}:***{}", &self.url[..scheme_end + 3], user, &rest[at..]);
            }
            return self.url.clone();
        }

        self.url
            .split_whitespace()
            .map(|pair| match pair.split_once('=') {
                Some((key, _)) if key.eq_ignore_ascii_case("password") => format!("{key}=***"),
                _ => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
