//! Statement log
//!
//! [`LoggedConnection`] decorates any [`SqlConnection`] and records its calls
//! to stdout or a file, as configured by [`SqlLogConfig`]. The configuration
//! travels with the connection request; nothing here is process-global.

use crate::connection::{ColumnMetadata, SqlConnection, SqlLogConfig, SqlLogLevel, SqlLogTarget};
use crate::error::{DbSetupError, Result, SqlError};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};

enum Sink {
    Stdout,
    File(BufWriter<File>),
}

/// A connection wrapper that records every call it forwards
pub struct LoggedConnection {
    inner: Box<dyn SqlConnection>,
    sink: Sink,
    sql_only: bool,
}

impl LoggedConnection {
    /// Wrap `inner` according to `config`; returns `inner` untouched when logging is off
    pub fn wrap(inner: Box<dyn SqlConnection>, config: &SqlLogConfig) -> Result<Box<dyn SqlConnection>> {
        if !config.is_enabled() {
            return Ok(inner);
        }

        let sink = match &config.target {
            SqlLogTarget::Stdout => Sink::Stdout,
            SqlLogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| DbSetupError::io(path, e))?;
                Sink::File(BufWriter::new(file))
            }
        };

        Ok(Box::new(Self {
            inner,
            sink,
            sql_only: config.level == SqlLogLevel::Sql,
        }))
    }

    fn record(&mut self, call: &str, detail: &str, sql_call: bool) {
        if self.sql_only && !sql_call {
            return;
        }
        let line = format!("{} [{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"), call, detail);
        let written = match &mut self.sink {
            Sink::Stdout => writeln!(io::stdout().lock(), "{line}"),
            Sink::File(writer) => writeln!(writer, "{line}").and_then(|()| writer.flush()),
        };
        if let Err(e) = written {
            log::warn!("Failed to write statement log: {e}");
        }
    }

    fn record_outcome<T>(&mut self, call: &str, result: &std::result::Result<T, SqlError>, sql_call: bool) {
        if let Err(e) = result {
            self.record(call, &format!("FAILED: {e}"), sql_call);
        }
    }
}

impl SqlConnection for LoggedConnection {
    fn product_name(&mut self) -> std::result::Result<String, SqlError> {
        let result = self.inner.product_name();
        if let Ok(name) = &result {
            let detail = name.clone();
            self.record("product", &detail, false);
        }
        result
    }

    fn execute(&mut self, sql: &str) -> std::result::Result<u64, SqlError> {
        self.record("execute", sql, true);
        let result = self.inner.execute(sql);
        self.record_outcome("execute", &result, true);
        result
    }

    fn query(&mut self, sql: &str) -> std::result::Result<Vec<Vec<Option<String>>>, SqlError> {
        self.record("query", sql, true);
        let result = self.inner.query(sql);
        self.record_outcome("query", &result, true);
        result
    }

    fn auto_commit(&self) -> bool {
        self.inner.auto_commit()
    }

    fn set_auto_commit(&mut self, enabled: bool) -> std::result::Result<(), SqlError> {
        self.record("autocommit", if enabled { "on" } else { "off" }, false);
        self.inner.set_auto_commit(enabled)
    }

    fn commit(&mut self) -> std::result::Result<(), SqlError> {
        self.record("commit", "", false);
        let result = self.inner.commit();
        self.record_outcome("commit", &result, false);
        result
    }

    fn rollback(&mut self) -> std::result::Result<(), SqlError> {
        self.record("rollback", "", false);
        let result = self.inner.rollback();
        self.record_outcome("rollback", &result, false);
        result
    }

    fn table_names(&mut self, schema: Option<&str>) -> std::result::Result<Vec<String>, SqlError> {
        self.record("tables", schema.unwrap_or("<default>"), false);
        self.inner.table_names(schema)
    }

    fn columns(
        &mut self,
        table: &str,
        schema: Option<&str>,
    ) -> std::result::Result<Vec<ColumnMetadata>, SqlError> {
        self.record("columns", table, false);
        self.inner.columns(table, schema)
    }

    fn close(&mut self) {
        self.record("close", "", false);
        if let Sink::File(writer) = &mut self.sink {
            let _ = writer.flush();
        }
        self.inner.close();
    }
}
