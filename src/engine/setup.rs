use super::{selected, SchemaEngine, Session};
use crate::connection::Connector;
use crate::data::DataRow;
use crate::error::{DbSetupError, Result, SqlError};
use crate::schema::{SchemaDocument, TableSpec};
use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// SQL Server error number for `SET IDENTITY_INSERT` on a table without an identity column
const NO_IDENTITY_ERROR_CODE: i32 = 8106;

static NO_IDENTITY_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)does not have the identity property").expect("static regex"));

/// What a `setup` run should do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupOptions {
    /// Only process this table (case-insensitive)
    pub table: Option<String>,
    /// Insert data into an existing schema without creating anything
    pub data_only: bool,
    /// Delete the rows of the filtered table before loading its data
    ///
    /// Only honored together with `table`; a full run never deletes.
    pub delete_first: bool,
}

impl SetupOptions {
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    pub fn data_only(mut self) -> Self {
        self.data_only = true;
        self
    }

    pub fn delete_first(mut self) -> Self {
        self.delete_first = true;
        self
    }
}

/// Objects created by a `setup` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub tables: usize,
    pub indexes: usize,
    pub views: usize,
    pub rows: usize,
}

impl<C: Connector> SchemaEngine<C> {
    /// Create the schema and load its data
    ///
    /// Tables are processed in declaration order, obsolete tables are
    /// skipped, and a table without columns only has its data loaded. All
    /// DDL is generated before the first statement runs, so declaration
    /// errors abort without touching the database. Any statement failure
    /// aborts the run.
    pub fn setup(&self, document: &SchemaDocument, options: &SetupOptions) -> Result<SetupReport> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("setup", document.source_name()).entered();

        let mut session = self.open()?;
        let dialect = session.dialect();

        let tables: Vec<&TableSpec> = document
            .tables()
            .iter()
            .filter(|t| !t.obsolete && selected(t, options.table.as_deref()))
            .collect();

        let mut plans = Vec::with_capacity(tables.len());
        for table in &tables {
            let plan = if options.data_only || table.columns.is_empty() {
                None
            } else {
                Some(table.create_commands(&self.types, dialect)?)
            };
            plans.push(plan);
        }

        let mut report = SetupReport::default();
        for (table, plan) in tables.into_iter().zip(plans) {
            log::debug!("Setting up table {}", table.name);

            if options.delete_first && options.table.is_some() {
                session.execute(&table.clear_command()).map_err(|e| {
                    DbSetupError::statement(format!("Failed to clear table {}", table.name), e)
                })?;
            }

            if let Some(commands) = plan {
                session.execute_all(&commands).map_err(|e| {
                    DbSetupError::statement(format!("Failed to create table {}", table.name), e)
                })?;
                report.tables += 1;
                log::debug!("Created table {}", table.name);
            }

            if !options.data_only {
                for index in &table.indexes {
                    session.execute(&index.create_command(dialect)).map_err(|e| {
                        DbSetupError::statement(
                            format!("Failed to create index {} on table {}", index.name, table.name),
                            e,
                        )
                    })?;
                    report.indexes += 1;
                    log::debug!("Created index {} on table {}", index.name, table.name);
                }
            }

            let rows = load_rows(&mut session, &table.name, table.row_source()).map_err(|e| {
                DbSetupError::statement(format!("Failed to create rows in table {}", table.name), e)
            })?;
            report.rows += rows;
            log::debug!("Created {} rows in table {}", rows, table.name);
        }

        if !options.data_only {
            for view in document.views() {
                session.execute(&view.create_command()).map_err(|e| {
                    DbSetupError::statement(format!("Failed to create view {}", view.name), e)
                })?;
                report.views += 1;
                log::debug!("Created view {}", view.name);
            }
        }

        log::info!(
            "Setup complete: {} tables, {} indexes, {} views, {} rows",
            report.tables,
            report.indexes,
            report.views,
            report.rows
        );
        Ok(report)
    }
}

/// Execute the statement for every row, returning how many rows were written
///
/// Where the dialect needs it, the whole phase is bracketed with identity
/// insert on/off so explicit values can be written into identity columns.
pub(crate) fn load_rows(
    session: &mut Session,
    table: &str,
    rows: impl Iterator<Item = DataRow>,
) -> std::result::Result<usize, SqlError> {
    let mut rows = rows.peekable();
    if rows.peek().is_none() {
        return Ok(0);
    }

    let dialect = session.dialect();
    let Some(identity_insert) = dialect.ops().identity_insert else {
        return write_rows(session, table, rows);
    };

    set_identity_insert(session, &identity_insert(table, true))?;
    let written = write_rows(session, table, rows);
    let reset = set_identity_insert(session, &identity_insert(table, false));
    let written = written?;
    reset?;
    Ok(written)
}

fn write_rows(
    session: &mut Session,
    table: &str,
    rows: impl Iterator<Item = DataRow>,
) -> std::result::Result<usize, SqlError> {
    let dialect = session.dialect();
    let mut written = 0;
    for row in rows {
        if let Some(sql) = row.to_sql(table, dialect) {
            session.execute(&sql)?;
            written += 1;
        }
    }
    Ok(written)
}

/// Toggle identity insert, treating "no identity column" as nothing to do
fn set_identity_insert(session: &mut Session, sql: &str) -> std::result::Result<(), SqlError> {
    match session.execute(sql) {
        Ok(_) => Ok(()),
        Err(e) if is_no_identity_error(&e) => {
            log::debug!("Ignoring '{sql}': table has no identity column");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn is_no_identity_error(error: &SqlError) -> bool {
    error.vendor_code == Some(NO_IDENTITY_ERROR_CODE) || NO_IDENTITY_MESSAGE.is_match(&error.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_identity_error_detection() {
        assert!(is_no_identity_error(&SqlError::new("whatever").with_code(8106)));
        assert!(is_no_identity_error(&SqlError::new(
            "Table 'FOO' does not have the identity property. Cannot perform SET operation."
        )));
        assert!(!is_no_identity_error(&SqlError::new("Invalid object name 'FOO'").with_code(208)));
    }

    #[test]
    fn test_options_builder() {
        let options = SetupOptions::default().table("FOO").data_only().delete_first();
        assert_eq!(options.table.as_deref(), Some("FOO"));
        assert!(options.data_only);
        assert!(options.delete_first);
    }
}
