use super::SchemaEngine;
use crate::connection::{ColumnMetadata, Connector};
use crate::data::SqlRowSource;
use crate::error::{DbSetupError, Result};
use chrono::Local;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Root element of an export snapshot
pub const EXPORT_ROOT: &str = "dbsetup-export";

/// Outcome of an `export` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub tables: usize,
    pub rows: usize,
}

impl<C: Connector> SchemaEngine<C> {
    /// Write a snapshot of every live table, its columns and its rows to `path`
    ///
    /// The snapshot is for reference only: it records native types and
    /// text-rendered values and cannot be fed back into `setup`.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<ExportReport> {
        let path = path.as_ref();

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("export", &path.display().to_string()).entered();

        let mut session = self.open()?;
        let dialect = session.dialect();
        let schema = (dialect.ops().metadata_schema)(self.config.user.as_deref());

        let table_names = session
            .connection()
            .table_names(schema.as_deref())
            .map_err(|e| DbSetupError::statement("Failed to list tables", e))?;

        let file = File::create(path).map_err(|e| DbSetupError::io(path, e))?;
        let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 4);
        let write_err = write_error(path);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(&write_err)?;
        let notice = format!(
            " Exported by dbsetup on {}. This file is a reference snapshot only; it cannot be used as setup input. ",
            Local::now().format("%Y-%m-%d %H:%M:%S %z")
        );
        writer
            .write_event(Event::Comment(BytesText::new(&notice)))
            .map_err(&write_err)?;

        let path_name = path.display().to_string();
        writer
            .write_event(Event::Start(
                BytesStart::new(EXPORT_ROOT).with_attributes([("name", path_name.as_str())]),
            ))
            .map_err(&write_err)?;

        let mut report = ExportReport {
            path: path.to_path_buf(),
            ..ExportReport::default()
        };

        for table in &table_names {
            log::debug!("Exporting table {table}");
            let columns = session
                .connection()
                .columns(table, schema.as_deref())
                .map_err(|e| DbSetupError::statement(format!("Failed to read columns of {table}"), e))?;

            writer
                .write_event(Event::Start(BytesStart::new("table").with_attributes([("name", table.as_str())])))
                .map_err(&write_err)?;

            for column in &columns {
                writer
                    .write_event(Event::Empty(column_element(column)))
                    .map_err(&write_err)?;
            }

            let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
            if !names.is_empty() {
                for row in SqlRowSource::query(session.connection(), table, &names, dialect)? {
                    let mut data = BytesStart::new("data");
                    for (column, value) in row.values() {
                        if let Some(value) = value {
                            data.push_attribute((column.as_str(), value.as_str()));
                        }
                    }
                    writer.write_event(Event::Empty(data)).map_err(&write_err)?;
                    report.rows += 1;
                }
            }

            writer
                .write_event(Event::End(BytesEnd::new("table")))
                .map_err(&write_err)?;
            report.tables += 1;
        }

        writer
            .write_event(Event::End(BytesEnd::new(EXPORT_ROOT)))
            .map_err(&write_err)?;
        writer.get_mut().flush().map_err(write_error(path))?;

        log::info!("Exported {} tables to {}", report.tables, path.display());
        Ok(report)
    }
}

fn write_error<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> DbSetupError + '_ {
    move |e| DbSetupError::io(path, std::io::Error::other(e.to_string()))
}

fn column_element(column: &ColumnMetadata) -> BytesStart<'static> {
    let mut element = BytesStart::new("column");
    element.push_attribute(("name", column.name.as_str()));
    element.push_attribute(("type", column.type_name.as_str()));
    element.push_attribute(("size", column.size.to_string().as_str()));
    if !column.nullable {
        element.push_attribute(("required", "true"));
    }
    element
}
