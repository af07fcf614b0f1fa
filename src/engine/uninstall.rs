use super::{SchemaEngine, Session, SetupOptions, SetupReport};
use crate::connection::Connector;
use crate::error::{DbSetupError, Result};
use crate::schema::{SchemaDocument, TableSpec};
use crate::typemap::TypeMaps;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Outcome of an `uninstall` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    pub dropped_views: usize,
    pub failed_views: usize,
    pub dropped_tables: usize,
    pub failed_tables: usize,
    /// One message per view or table that could not be dropped
    pub failures: Vec<String>,
}

impl UninstallReport {
    pub fn is_success(&self) -> bool {
        self.failed_views + self.failed_tables == 0
    }
}

/// Outcome of `uninstall_setup`; setup only runs after a clean uninstall
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallSetupReport {
    pub uninstall: UninstallReport,
    pub setup: Option<SetupReport>,
}

impl UninstallSetupReport {
    pub fn is_success(&self) -> bool {
        self.uninstall.is_success() && self.setup.is_some()
    }
}

impl<C: Connector> SchemaEngine<C> {
    /// Drop the document's views, then its tables in reverse declaration order
    ///
    /// Failures are logged and counted; every view and table is attempted.
    pub fn uninstall(&self, document: &SchemaDocument) -> Result<UninstallReport> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::operation_span("uninstall", document.source_name()).entered();

        let mut session = self.open()?;
        let dialect = session.dialect();
        let mut report = UninstallReport::default();

        for view in document.views() {
            match session.execute(&view.drop_command()) {
                Ok(_) => {
                    report.dropped_views += 1;
                    log::debug!("Dropped view {}", view.name);
                }
                Err(e) => {
                    report.failed_views += 1;
                    let error = DbSetupError::statement(format!("Failed to drop view {}", view.name), e);
                    log::error!("{error}");
                    report.failures.push(error.to_string());
                }
            }
        }

        for table in document.tables().iter().rev() {
            match drop_table(&mut session, table, &self.types) {
                Ok(()) => {
                    report.dropped_tables += 1;
                    log::debug!("Dropped table {}", table.name);
                }
                Err(e) => {
                    report.failed_tables += 1;
                    log::error!("{e}");
                    report.failures.push(e.to_string());
                }
            }
        }

        for sql in dialect.ops().table_cleanup {
            if let Err(e) = session.execute(sql) {
                log::debug!("Post-uninstall cleanup '{sql}' failed: {e}");
            }
        }

        log::info!("Dropped {} views", report.dropped_views);
        log::info!("Dropped {} tables", report.dropped_tables);
        log::info!("Failed to drop {} views", report.failed_views);
        log::info!("Failed to drop {} tables", report.failed_tables);
        Ok(report)
    }

    /// Uninstall, then set the schema up again if the uninstall was clean
    pub fn uninstall_setup(
        &self,
        document: &SchemaDocument,
        options: &SetupOptions,
    ) -> Result<UninstallSetupReport> {
        let uninstall = self.uninstall(document)?;
        if !uninstall.is_success() {
            log::warn!("Uninstall reported failures; not running setup");
            return Ok(UninstallSetupReport {
                uninstall,
                setup: None,
            });
        }
        let setup = self.setup(document, options)?;
        Ok(UninstallSetupReport {
            uninstall,
            setup: Some(setup),
        })
    }
}

/// Attempt every drop command for a table, reporting all failures together
pub(crate) fn drop_table(session: &mut Session, table: &TableSpec, types: &TypeMaps) -> Result<()> {
    let commands = table.drop_commands(types, session.dialect());
    let errors = session.execute_each(&commands);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DbSetupError::Drop {
            table: table.name.clone(),
            errors,
        })
    }
}
