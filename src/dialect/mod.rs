//! SQL dialects
//!
//! Every vendor difference the engine cares about lives in one
//! [`DialectOps`] table per [`Dialect`]. Schema objects stay plain data and
//! ask `dialect.ops()` for the vendor-specific pieces (default clauses,
//! sequence objects, size handling, table and index options, literal
//! rewriting, metadata conventions).

mod generic;
mod h2;
mod oracle;
mod postgres;
mod sqlserver;

use crate::error::DbSetupError;
use crate::schema::column::{ColumnContext, ColumnDefault};
use crate::schema::constraint::ConstraintSpec;
use crate::schema::index::IndexSpec;
use crate::schema::table::TableSpec;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Cache size for generated sequences
pub(crate) const SEQUENCE_CACHE_SIZE: u32 = 10;

/// The database families the engine can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Generic,
    Oracle,
    Postgres,
    SqlServer,
    H2,
}

impl Dialect {
    /// Every supported dialect
    pub const ALL: [Dialect; 5] = [
        Dialect::Generic,
        Dialect::Oracle,
        Dialect::Postgres,
        Dialect::SqlServer,
        Dialect::H2,
    ];

    /// Resolve the dialect from the product name a connection reports
    ///
    /// Anything unrecognised is treated as [`Dialect::Generic`].
    pub fn resolve(product_name: &str) -> Dialect {
        let product = product_name.to_ascii_lowercase();
        if product.contains("postgres") {
            Dialect::Postgres
        } else if product.contains("oracle") {
            Dialect::Oracle
        } else if product.contains("sql server") || product.contains("sqlserver") {
            Dialect::SqlServer
        } else if product == "h2" || product.starts_with("h2 ") || product.starts_with("h2/") {
            Dialect::H2
        } else {
            Dialect::Generic
        }
    }

    /// Short lowercase name, as used in type map files
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::Oracle => "oracle",
            Dialect::Postgres => "postgresql",
            Dialect::SqlServer => "sqlserver",
            Dialect::H2 => "h2",
        }
    }

    /// The capability table for this dialect
    pub fn ops(self) -> &'static DialectOps {
        match self {
            Dialect::Generic => &generic::OPS,
            Dialect::Oracle => &oracle::OPS,
            Dialect::Postgres => &postgres::OPS,
            Dialect::SqlServer => &sqlserver::OPS,
            Dialect::H2 => &h2::OPS,
        }
    }

    /// Rewrite `TRUE`/`FALSE` literals to `1`/`0` where the dialect has no boolean literal
    pub fn boolean_literal(self, value: &str) -> Cow<'_, str> {
        if !self.ops().numeric_booleans {
            return Cow::Borrowed(value);
        }
        if value.eq_ignore_ascii_case("true") {
            Cow::Borrowed("1")
        } else if value.eq_ignore_ascii_case("false") {
            Cow::Borrowed("0")
        } else {
            Cow::Borrowed(value)
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = DbSetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(Dialect::Generic),
            "oracle" => Ok(Dialect::Oracle),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "h2" => Ok(Dialect::H2),
            _ => Err(DbSetupError::UnknownDialect(s.to_string())),
        }
    }
}

/// Per-dialect behaviour, looked up once per document via [`Dialect::ops`]
pub struct DialectOps {
    /// Whether a native type must be declared with an explicit size
    pub size_required: fn(native_type: &str) -> bool,
    /// The size actually rendered for a native type (some types reject sizes)
    pub effective_size: fn(native_type: &str, size: usize) -> usize,
    /// `TYPE` or `TYPE(size)` for the column
    pub type_clause: fn(&ColumnContext<'_>) -> String,
    /// `DEFAULT ...` / identity clause, if any
    pub default_clause: fn(&ColumnContext<'_>) -> Option<String>,
    /// Statements that must run before `CREATE TABLE`
    pub pre_create: fn(&ColumnContext<'_>) -> Vec<String>,
    /// Statements that must run after `CREATE TABLE`
    pub post_create: fn(&ColumnContext<'_>) -> Vec<String>,
    /// Statements that clean up column-owned objects after `DROP TABLE`
    pub drop_commands: fn(&ColumnContext<'_>) -> Vec<String>,
    /// Whether `ON DELETE` may be rendered for a reference from `table` to `references`
    pub on_delete_allowed: fn(table: &str, references: &str) -> bool,
    /// Statements that must run after `CREATE TABLE` for a table-level constraint
    pub constraint_post_create: fn(table: &str, constraint: &ConstraintSpec) -> Vec<String>,
    /// Storage and engine options appended to `CREATE TABLE (...)`
    pub table_options: fn(&TableSpec) -> String,
    /// Options appended to `CREATE INDEX ... (...)`
    pub index_options: fn(&IndexSpec) -> String,
    /// `TRUE`/`FALSE` literals must be written as `1`/`0`
    pub numeric_booleans: bool,
    /// Schema filter for metadata enumeration, derived from the login user
    pub metadata_schema: fn(user: Option<&str>) -> Option<String>,
    /// Select-list expression that yields a column's value as text
    pub text_projection: fn(column: &str) -> String,
    /// Best-effort statements run after all tables are dropped
    pub table_cleanup: &'static [&'static str],
    /// Statement toggling explicit writes into identity columns
    pub identity_insert: Option<fn(table: &str, enabled: bool) -> String>,
}

/// `TYPE(size)`, unless the type already carries its own size or has none
pub(crate) fn sized_type(native_type: &str, size: usize) -> String {
    if size == 0 || native_type.contains('(') {
        native_type.to_string()
    } else {
        format!("{native_type}({size})")
    }
}

/// Base type name without any size suffix, uppercased
pub(crate) fn base_type(native_type: &str) -> String {
    native_type
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_uppercase()
}

/// `DEFAULT ...` for the dialect-neutral default kinds
pub(crate) fn plain_default(ctx: &ColumnContext<'_>, dialect: Dialect, now: &str) -> Option<String> {
    match &ctx.column.default {
        ColumnDefault::CurrentTime => Some(format!("DEFAULT {now}")),
        ColumnDefault::Literal(value) => Some(format!("DEFAULT {}", dialect.boolean_literal(value))),
        ColumnDefault::None | ColumnDefault::AutoIncrement | ColumnDefault::SequenceOnly => None,
    }
}

pub(crate) fn no_commands(_ctx: &ColumnContext<'_>) -> Vec<String> {
    Vec::new()
}

pub(crate) fn no_constraint_commands(_table: &str, _constraint: &ConstraintSpec) -> Vec<String> {
    Vec::new()
}

pub(crate) fn no_table_options(_table: &TableSpec) -> String {
    String::new()
}

pub(crate) fn no_schema(_user: Option<&str>) -> Option<String> {
    None
}

pub(crate) fn uppercase_user(user: Option<&str>) -> Option<String> {
    user.map(str::to_ascii_uppercase)
}

pub(crate) fn always(_table: &str, _references: &str) -> bool {
    true
}

pub(crate) fn no_size_required(_native_type: &str) -> bool {
    false
}

pub(crate) fn keep_size(_native_type: &str, size: usize) -> usize {
    size
}

pub(crate) fn default_type_clause(ctx: &ColumnContext<'_>) -> String {
    sized_type(ctx.native_type, ctx.size)
}

/// Drops for a column that owns a generated sequence
pub(crate) fn drop_owned_sequence(ctx: &ColumnContext<'_>) -> Vec<String> {
    if ctx.column.default.uses_sequence() {
        vec![format!("DROP SEQUENCE {}", ctx.sequence_name())]
    } else {
        Vec::new()
    }
}

/// Index tablespace clause shared by the dialects that support one
pub(crate) fn index_tablespace(index: &IndexSpec) -> String {
    match &index.tablespace {
        Some(ts) => format!(" TABLESPACE {ts}"),
        None => String::new(),
    }
}

/// Warns about an index condition the dialect cannot express
pub(crate) fn ignore_condition(index: &IndexSpec, dialect: Dialect) {
    if let Some(condition) = &index.condition {
        log::warn!(
            "Index {} declares condition '{}' which {} does not support; ignoring it",
            index.name,
            condition,
            dialect
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_product_names() {
        assert_eq!(Dialect::resolve("PostgreSQL 16.2"), Dialect::Postgres);
        assert_eq!(Dialect::resolve("Oracle"), Dialect::Oracle);
        assert_eq!(Dialect::resolve("Microsoft SQL Server"), Dialect::SqlServer);
        assert_eq!(Dialect::resolve("H2"), Dialect::H2);
        assert_eq!(Dialect::resolve("MySQL"), Dialect::Generic);
    }

    #[test]
    fn test_from_str_round_trips_names() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.name().parse::<Dialect>().unwrap(), dialect);
        }
        assert!("db2".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_boolean_literal_only_rewritten_for_numeric_dialects() {
        assert_eq!(Dialect::Oracle.boolean_literal("TRUE"), "1");
        assert_eq!(Dialect::SqlServer.boolean_literal("false"), "0");
        assert_eq!(Dialect::Oracle.boolean_literal("maybe"), "maybe");
        assert_eq!(Dialect::Postgres.boolean_literal("TRUE"), "TRUE");
        assert_eq!(Dialect::H2.boolean_literal("false"), "false");
        assert_eq!(Dialect::Generic.boolean_literal("True"), "True");
    }

    #[test]
    fn test_sized_type() {
        assert_eq!(sized_type("VARCHAR", 40), "VARCHAR(40)");
        assert_eq!(sized_type("NUMBER(19)", 40), "NUMBER(19)");
        assert_eq!(sized_type("INTEGER", 0), "INTEGER");
    }

    #[test]
    fn test_base_type() {
        assert_eq!(base_type("varchar(max)"), "VARCHAR");
        assert_eq!(base_type("CLOB"), "CLOB");
    }
}
