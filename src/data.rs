//! Data rows and the statements they turn into
//!
//! A [`DataRow`] is an ordered list of column/value pairs. A column whose
//! name starts with [`KEY_PREFIX`] is a key: any row carrying one becomes an
//! `UPDATE ... WHERE key = value`, every other row is an `INSERT`.

use crate::connection::SqlConnection;
use crate::dialect::Dialect;
use crate::error::{DbSetupError, Result};
use crate::schema::Element;

/// Marks a data attribute as a key column
pub const KEY_PREFIX: &str = "__";

/// Statement class chosen for a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Insert,
    Update,
}

/// One row of literal values, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataRow {
    values: Vec<(String, Option<String>)>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a non-null value
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((column.into(), Some(value.into())));
        self
    }

    /// Append a value that may be NULL
    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        self.values.push((column.into(), value));
    }

    /// Every attribute of a `<data>` element, in document order
    pub(crate) fn from_element(element: &Element) -> Self {
        Self {
            values: element
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), Some(value.clone())))
                .collect(),
        }
    }

    pub fn values(&self) -> &[(String, Option<String>)] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn action(&self) -> RowAction {
        if self.values.iter().any(|(name, _)| name.starts_with(KEY_PREFIX)) {
            RowAction::Update
        } else {
            RowAction::Insert
        }
    }

    /// The statement for this row, or `None` when there is nothing to write
    pub fn to_sql(&self, table: &str, dialect: Dialect) -> Option<String> {
        match self.action() {
            RowAction::Insert => self.insert_sql(table, dialect),
            RowAction::Update => self.update_sql(table, dialect),
        }
    }

    fn insert_sql(&self, table: &str, dialect: Dialect) -> Option<String> {
        if self.values.is_empty() {
            return None;
        }
        let columns: Vec<&str> = self.values.iter().map(|(name, _)| name.as_str()).collect();
        let values: Vec<String> = self
            .values
            .iter()
            .map(|(_, value)| literal(value.as_deref(), dialect))
            .collect();
        Some(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(","),
            values.join(",")
        ))
    }

    fn update_sql(&self, table: &str, dialect: Dialect) -> Option<String> {
        let (keys, sets): (Vec<_>, Vec<_>) = self
            .values
            .iter()
            .partition(|(name, _)| name.starts_with(KEY_PREFIX));

        if sets.is_empty() {
            log::warn!("Data row for {table} has key columns but nothing to update; skipping it");
            return None;
        }

        let assignments: Vec<String> = sets
            .iter()
            .map(|(name, value)| format!("{} = {}", name, literal(value.as_deref(), dialect)))
            .collect();
        let conditions: Vec<String> = keys
            .iter()
            .map(|(name, value)| {
                let column = &name[KEY_PREFIX.len()..];
                match value {
                    Some(v) => format!("{} = {}", column, literal(Some(v.as_str()), dialect)),
                    None => format!("{column} IS NULL"),
                }
            })
            .collect();

        Some(format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            assignments.join(", "),
            conditions.join(" AND ")
        ))
    }
}

/// A quoted SQL literal, `NULL` for a missing value
pub fn literal(value: Option<&str>, dialect: Dialect) -> String {
    match value {
        None => "NULL".to_string(),
        Some(v) => format!("'{}'", dialect.boolean_literal(v).replace('\'', "''")),
    }
}

/// Rows declared in a document
pub struct XmlRowSource<'a> {
    rows: std::slice::Iter<'a, DataRow>,
}

impl<'a> XmlRowSource<'a> {
    pub fn new(rows: &'a [DataRow]) -> Self {
        Self { rows: rows.iter() }
    }
}

impl Iterator for XmlRowSource<'_> {
    type Item = DataRow;

    fn next(&mut self) -> Option<DataRow> {
        self.rows.next().cloned()
    }
}

/// Rows read from a live table
pub struct SqlRowSource {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Option<String>>>,
}

impl SqlRowSource {
    /// Select every row of `table`, each column projected to text for `dialect`
    pub fn query(
        conn: &mut dyn SqlConnection,
        table: &str,
        columns: &[String],
        dialect: Dialect,
    ) -> Result<Self> {
        let projection: Vec<String> = columns
            .iter()
            .map(|c| (dialect.ops().text_projection)(c))
            .collect();
        let sql = format!("SELECT {} FROM {}", projection.join(", "), table);
        let rows = conn
            .query(&sql)
            .map_err(|e| DbSetupError::statement(format!("Failed to read data from {table}"), e))?;
        Ok(Self {
            columns: columns.to_vec(),
            rows: rows.into_iter(),
        })
    }
}

impl Iterator for SqlRowSource {
    type Item = DataRow;

    fn next(&mut self) -> Option<DataRow> {
        let values = self.rows.next()?;
        let mut row = DataRow::new();
        for (column, value) in self.columns.iter().zip(values) {
            row.push(column.clone(), value);
        }
        Some(row)
    }
}

/// A single-pass stream of rows for one table
pub enum RowSource<'a> {
    Xml(XmlRowSource<'a>),
    Sql(SqlRowSource),
}

impl Iterator for RowSource<'_> {
    type Item = DataRow;

    fn next(&mut self) -> Option<DataRow> {
        match self {
            RowSource::Xml(source) => source.next(),
            RowSource::Sql(source) => source.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockDatabase;

    #[test]
    fn test_insert_statement() {
        let row = DataRow::new().with("ID", "1").with("NAME", "bob");
        assert_eq!(row.action(), RowAction::Insert);
        assert_eq!(
            row.to_sql("t", Dialect::Postgres).unwrap(),
            "INSERT INTO t (ID,NAME) VALUES ('1','bob')"
        );
    }

    #[test]
    fn test_update_statement() {
        let row = DataRow::new().with("__ID", "1").with("COUNTRY", "US");
        assert_eq!(row.action(), RowAction::Update);
        assert_eq!(
            row.to_sql("t", Dialect::Postgres).unwrap(),
            "UPDATE t SET COUNTRY = 'US' WHERE ID = '1'"
        );
    }

    #[test]
    fn test_update_with_composite_key() {
        let row = DataRow::new().with("__A", "1").with("X", "y").with("__B", "2");
        assert_eq!(
            row.to_sql("t", Dialect::H2).unwrap(),
            "UPDATE t SET X = 'y' WHERE A = '1' AND B = '2'"
        );
    }

    #[test]
    fn test_update_without_assignments_is_skipped() {
        let row = DataRow::new().with("__ID", "1");
        assert!(row.to_sql("t", Dialect::Postgres).is_none());
    }

    #[test]
    fn test_null_and_quote_rendering() {
        let mut row = DataRow::new().with("NAME", "O'Brien");
        row.push("NOTE", None);
        assert_eq!(
            row.to_sql("t", Dialect::Generic).unwrap(),
            "INSERT INTO t (NAME,NOTE) VALUES ('O''Brien',NULL)"
        );
    }

    #[test]
    fn test_boolean_rewrite_in_rows() {
        let insert = DataRow::new().with("ENABLED", "true");
        assert_eq!(
            insert.to_sql("t", Dialect::Oracle).unwrap(),
            "INSERT INTO t (ENABLED) VALUES ('1')"
        );
        assert_eq!(
            insert.to_sql("t", Dialect::Postgres).unwrap(),
            "INSERT INTO t (ENABLED) VALUES ('true')"
        );

        let update = DataRow::new().with("__ID", "7").with("ENABLED", "FALSE");
        assert_eq!(
            update.to_sql("t", Dialect::SqlServer).unwrap(),
            "UPDATE t SET ENABLED = '0' WHERE ID = '7'"
        );
    }

    #[test]
    fn test_xml_source_is_single_pass() {
        let rows = vec![DataRow::new().with("A", "1"), DataRow::new().with("A", "2")];
        let mut source = XmlRowSource::new(&rows);
        assert_eq!(source.by_ref().count(), 2);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_sql_source_projects_columns_as_text() {
        let db = MockDatabase::new("PostgreSQL 16");
        db.with_rows(
            "SELECT CAST(ID AS TEXT), CAST(NAME AS TEXT) FROM FOO",
            vec![vec![Some("1".to_string()), None]],
        );
        let mut conn = db.connection();
        let columns = vec!["ID".to_string(), "NAME".to_string()];
        let rows: Vec<DataRow> = SqlRowSource::query(conn.as_mut(), "FOO", &columns, Dialect::Postgres)
            .unwrap()
            .collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].values(),
            &[("ID".to_string(), Some("1".to_string())), ("NAME".to_string(), None)]
        );
    }
}
