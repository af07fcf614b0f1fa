use super::{selected, SchemaEngine};
use crate::connection::Connector;
use crate::error::Result;
use crate::schema::{SchemaDocument, TableSpec};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Outcome of a `clear` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Tables emptied, in either pass
    pub cleared: usize,
    /// Tables still failing after the second pass
    pub failed: usize,
    /// Tables that failed the first pass and were tried again
    pub retried: usize,
}

impl ClearReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl<C: Connector> SchemaEngine<C> {
    /// Delete all rows from the document's tables, keeping the schema
    ///
    /// Tables are cleared in reverse declaration order. Tables whose delete
    /// fails in the first pass (typically a foreign key from a table not yet
    /// cleared) are retried once in a second pass. This resolves one level
    /// of ordering conflicts only; deeper reference chains can still fail.
    /// Failures are counted, never raised.
    pub fn clear(&self, document: &SchemaDocument, table: Option<&str>) -> Result<ClearReport> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("clear", document.source_name()).entered();

        let mut session = self.open()?;
        let mut report = ClearReport::default();
        let mut queued: Vec<&TableSpec> = Vec::new();

        for spec in document.tables().iter().rev().filter(|t| selected(t, table)) {
            match session.execute(&spec.clear_command()) {
                Ok(_) => {
                    report.cleared += 1;
                    log::debug!("Cleared table {}", spec.name);
                }
                Err(e) => {
                    log::debug!("First pass failed to clear table {}: {}", spec.name, e);
                    queued.push(spec);
                }
            }
        }

        report.retried = queued.len();
        if !queued.is_empty() {
            log::debug!("Second pass over {} tables", queued.len());
        }
        for spec in queued {
            match session.execute(&spec.clear_command()) {
                Ok(_) => {
                    report.cleared += 1;
                    log::debug!("Cleared table {}", spec.name);
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!("Failed to clear table {}: {}", spec.name, e);
                }
            }
        }

        log::info!("Cleared {} tables", report.cleared);
        log::info!("Failed to clear {} tables", report.failed);
        Ok(report)
    }
}
