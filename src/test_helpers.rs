//! In-memory connection for tests
//!
//! [`MockDatabase`] is a scripted stand-in for a live database: it records
//! every statement it is asked to run, can be told to fail specific
//! statements (always or a fixed number of times), and serves canned
//! metadata and query results. Clones share state, so a test keeps one
//! handle for assertions while the engine owns the connection.

use crate::connection::{ColumnMetadata, ConnectionConfig, Connector, SqlConnection};
use crate::error::{Result, SqlError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct ScriptedFailure {
    sql: String,
    remaining: Option<usize>,
    error: SqlError,
}

#[derive(Default)]
struct MockState {
    product_name: String,
    executed: Vec<String>,
    queries: Vec<String>,
    commits: usize,
    rollbacks: usize,
    auto_commit: bool,
    connects: usize,
    closes: usize,
    closed: bool,
    failures: Vec<ScriptedFailure>,
    tables: Vec<(String, Vec<ColumnMetadata>)>,
    rows: HashMap<String, Vec<Vec<Option<String>>>>,
    schema_filters: Vec<Option<String>>,
}

impl MockState {
    fn take_failure(&mut self, sql: &str) -> Option<SqlError> {
        let failure = self.failures.iter_mut().find(|f| {
            f.sql == sql && f.remaining.map_or(true, |n| n > 0)
        })?;
        if let Some(n) = failure.remaining.as_mut() {
            *n -= 1;
        }
        Some(failure.error.clone())
    }
}

/// Shared handle onto a scripted in-memory database
#[derive(Clone)]
pub struct MockDatabase {
    state: Rc<RefCell<MockState>>,
}

impl MockDatabase {
    /// A database reporting `product_name` (e.g. `"PostgreSQL 16.2"`, `"Oracle"`)
    pub fn new(product_name: &str) -> Self {
        let state = MockState {
            product_name: product_name.to_string(),
            auto_commit: true,
            ..MockState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Fail every execution of `sql` with `error`
    pub fn fail_on(&self, sql: &str, error: SqlError) {
        self.state.borrow_mut().failures.push(ScriptedFailure {
            sql: sql.to_string(),
            remaining: None,
            error,
        });
    }

    /// Fail the next `times` executions of `sql`, then let it succeed
    pub fn fail_times(&self, sql: &str, times: usize, error: SqlError) {
        self.state.borrow_mut().failures.push(ScriptedFailure {
            sql: sql.to_string(),
            remaining: Some(times),
            error,
        });
    }

    /// Register a live table for metadata introspection
    pub fn with_table(&self, name: &str, columns: Vec<ColumnMetadata>) -> &Self {
        self.state.borrow_mut().tables.push((name.to_string(), columns));
        self
    }

    /// Canned result for an exact query text
    pub fn with_rows(&self, sql: &str, rows: Vec<Vec<Option<String>>>) -> &Self {
        self.state.borrow_mut().rows.insert(sql.to_string(), rows);
        self
    }

    /// Every statement attempted via `execute`, in order, including failed ones
    pub fn executed(&self) -> Vec<String> {
        self.state.borrow().executed.clone()
    }

    /// Every query text run via `query`
    pub fn queries(&self) -> Vec<String> {
        self.state.borrow().queries.clone()
    }

    pub fn commits(&self) -> usize {
        self.state.borrow().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.borrow().rollbacks
    }

    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }

    pub fn closes(&self) -> usize {
        self.state.borrow().closes
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Schema filters passed to `table_names`, in order
    pub fn schema_filters(&self) -> Vec<Option<String>> {
        self.state.borrow().schema_filters.clone()
    }

    /// A connection onto this database
    pub fn connection(&self) -> Box<dyn SqlConnection> {
        {
            let mut state = self.state.borrow_mut();
            state.connects += 1;
            state.closed = false;
        }
        Box::new(MockConnection { db: self.clone() })
    }

    /// A connector handing out connections onto this database
    pub fn connector(&self) -> MockConnector {
        MockConnector { db: self.clone() }
    }
}

/// [`Connector`] over a [`MockDatabase`]
pub struct MockConnector {
    db: MockDatabase,
}

impl Connector for MockConnector {
    fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn SqlConnection>> {
        Ok(self.db.connection())
    }
}

/// A connection onto a [`MockDatabase`]
pub struct MockConnection {
    db: MockDatabase,
}

impl SqlConnection for MockConnection {
    fn product_name(&mut self) -> std::result::Result<String, SqlError> {
        Ok(self.db.state.borrow().product_name.clone())
    }

    fn execute(&mut self, sql: &str) -> std::result::Result<u64, SqlError> {
        let mut state = self.db.state.borrow_mut();
        state.executed.push(sql.to_string());
        match state.take_failure(sql) {
            Some(error) => Err(error),
            None => Ok(1),
        }
    }

    fn query(&mut self, sql: &str) -> std::result::Result<Vec<Vec<Option<String>>>, SqlError> {
        let mut state = self.db.state.borrow_mut();
        state.queries.push(sql.to_string());
        if let Some(error) = state.take_failure(sql) {
            return Err(error);
        }
        Ok(state.rows.get(sql).cloned().unwrap_or_default())
    }

    fn auto_commit(&self) -> bool {
        self.db.state.borrow().auto_commit
    }

    fn set_auto_commit(&mut self, enabled: bool) -> std::result::Result<(), SqlError> {
        self.db.state.borrow_mut().auto_commit = enabled;
        Ok(())
    }

    fn commit(&mut self) -> std::result::Result<(), SqlError> {
        self.db.state.borrow_mut().commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> std::result::Result<(), SqlError> {
        self.db.state.borrow_mut().rollbacks += 1;
        Ok(())
    }

    fn table_names(&mut self, schema: Option<&str>) -> std::result::Result<Vec<String>, SqlError> {
        let mut state = self.db.state.borrow_mut();
        state.schema_filters.push(schema.map(str::to_string));
        Ok(state.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    fn columns(
        &mut self,
        table: &str,
        _schema: Option<&str>,
    ) -> std::result::Result<Vec<ColumnMetadata>, SqlError> {
        let state = self.db.state.borrow();
        state
            .tables
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(table))
            .map(|(_, columns)| columns.clone())
            .ok_or_else(|| SqlError::new(format!("table {table} does not exist")))
    }

    fn close(&mut self) {
        let mut state = self.db.state.borrow_mut();
        state.closes += 1;
        state.closed = true;
    }
}

/// Shorthand for building [`ColumnMetadata`] in tests
pub fn column_meta(name: &str, type_name: &str, size: usize, nullable: bool) -> ColumnMetadata {
    ColumnMetadata {
        name: name.to_string(),
        type_name: type_name.to_string(),
        size,
        nullable,
    }
}
