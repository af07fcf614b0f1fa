//! Table declarations and DDL assembly

use super::{ColumnSpec, ConstraintSpec, Element, IndexSpec, NodeKind, MAX_NAME_LENGTH};
use crate::data::{DataRow, RowSource, XmlRowSource};
use crate::dialect::Dialect;
use crate::error::{DbSetupError, Result};
use crate::typemap::TypeMaps;

/// A table's full declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    /// Creation order; also the column order of positional data
    pub columns: Vec<ColumnSpec>,
    pub constraints: Vec<ConstraintSpec>,
    pub indexes: Vec<IndexSpec>,
    pub rows: Vec<DataRow>,
    pub index_organized: bool,
    pub parallel: bool,
    pub logging: bool,
    pub cache: bool,
    pub tablespace: Option<String>,
    pub storage_options: Option<String>,
    pub engine: Option<String>,
    /// Never created, but still cleared and dropped
    pub obsolete: bool,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
            indexes: Vec::new(),
            rows: Vec::new(),
            index_organized: false,
            parallel: false,
            logging: true,
            cache: false,
            tablespace: None,
            storage_options: None,
            engine: None,
            obsolete: false,
        }
    }

    pub fn with_column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintSpec) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_row(mut self, row: DataRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Build from a `<table>` element
    ///
    /// Malformed `<column>`, `<index>` and `<constraint>` children, and
    /// children of unknown kinds, are skipped with a warning.
    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        let name = element
            .attr("name")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| DbSetupError::MissingAttribute {
                element: element.name.clone(),
                attribute: "name".to_string(),
            })?;

        let mut table = TableSpec::new(name);
        table.index_organized = element.flag("index-organized");
        table.parallel = element.flag("parallel");
        table.logging = element.flag_or("logging", true);
        table.cache = element.flag("cache");
        table.tablespace = element.attr("tablespace").map(str::to_string);
        table.storage_options = element.attr("storage-options").map(str::to_string);
        table.engine = element.attr("engine").map(str::to_string);
        table.obsolete = element.flag("obsolete");

        for child in &element.children {
            match child.kind() {
                NodeKind::Column => match ColumnSpec::from_element(child) {
                    Some(column) => table.columns.push(column),
                    None => log::warn!("Skipping malformed column in table {name}"),
                },
                NodeKind::Index => match IndexSpec::from_element(child, name) {
                    Some(index) => table.indexes.push(index),
                    None => log::warn!("Skipping malformed index in table {name}"),
                },
                NodeKind::Constraint => match ConstraintSpec::from_element(child) {
                    Some(constraint) => table.constraints.push(constraint),
                    None => log::warn!("Skipping malformed constraint in table {name}"),
                },
                NodeKind::Data => table.rows.push(DataRow::from_element(child)),
                _ => log::warn!("Skipping unknown element <{}> in table {name}", child.name),
            }
        }

        Ok(table)
    }

    pub fn validate_name(&self) -> Result<()> {
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(DbSetupError::NameTooLong {
                kind: "Table",
                name: self.name.clone(),
                limit: MAX_NAME_LENGTH,
            });
        }
        Ok(())
    }

    /// Column pre-commands, `CREATE TABLE`, column post-commands, constraint post-commands
    pub fn create_commands(&self, types: &TypeMaps, dialect: Dialect) -> Result<Vec<String>> {
        self.validate_name()?;

        let mut fragments = Vec::with_capacity(self.columns.len() + self.constraints.len());
        for column in &self.columns {
            fragments.push(column.create_fragment(&self.name, types, dialect)?);
        }
        for constraint in &self.constraints {
            fragments.push(constraint.create_fragment(&self.name, dialect));
        }

        let mut commands: Vec<String> = self
            .columns
            .iter()
            .flat_map(|c| c.pre_create_commands(&self.name, types, dialect))
            .collect();
        commands.push(format!(
            "CREATE TABLE {} ({}){}",
            self.name,
            fragments.join(", "),
            (dialect.ops().table_options)(self)
        ));
        commands.extend(
            self.columns
                .iter()
                .flat_map(|c| c.post_create_commands(&self.name, types, dialect)),
        );
        commands.extend(
            self.constraints
                .iter()
                .flat_map(|c| c.post_create_commands(&self.name, dialect)),
        );
        Ok(commands)
    }

    pub fn clear_command(&self) -> String {
        format!("DELETE FROM {}", self.name)
    }

    /// `DROP TABLE` followed by every column's cleanup; each must be attempted
    pub fn drop_commands(&self, types: &TypeMaps, dialect: Dialect) -> Vec<String> {
        let mut commands = vec![format!("DROP TABLE {}", self.name)];
        commands.extend(
            self.columns
                .iter()
                .flat_map(|c| c.drop_commands(&self.name, types, dialect)),
        );
        commands
    }

    /// The declared data rows
    pub fn row_source(&self) -> RowSource<'_> {
        RowSource::Xml(XmlRowSource::new(&self.rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDefault, ConstraintSpec};

    fn foo() -> TableSpec {
        TableSpec::new("FOO")
            .with_column(
                ColumnSpec::new("ID", "INTEGER")
                    .primary_key()
                    .with_default(ColumnDefault::AutoIncrement),
            )
            .with_column(ColumnSpec::new("NAME", "VARCHAR2").with_size(100).required())
    }

    #[test]
    fn test_postgres_create_commands() {
        let commands = foo().create_commands(&TypeMaps::new(), Dialect::Postgres).unwrap();
        assert_eq!(
            commands,
            vec![
                "CREATE SEQUENCE FOO_ID_SEQ START 1 INCREMENT 1 CACHE 10".to_string(),
                "CREATE TABLE FOO (ID INTEGER DEFAULT nextval('FOO_ID_SEQ') PRIMARY KEY, NAME VARCHAR(100) NOT NULL)"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_oracle_create_commands_order_and_options() {
        let mut table = foo().with_constraint(ConstraintSpec::primary_key(None, &["ID", "NAME"]));
        table.tablespace = Some("DATA_TS".to_string());
        table.storage_options = Some("INITIAL 1M".to_string());
        table.parallel = true;
        table.logging = false;
        table.cache = true;

        let commands = table.create_commands(&TypeMaps::new(), Dialect::Oracle).unwrap();
        assert_eq!(commands.len(), 3);
        assert!(commands[0].starts_with("CREATE SEQUENCE FOO_ID_SEQ"));
        assert_eq!(
            commands[1],
            "CREATE TABLE FOO (ID INTEGER PRIMARY KEY, NAME VARCHAR2(100) NOT NULL, PRIMARY KEY (ID, NAME)) \
             TABLESPACE DATA_TS STORAGE(INITIAL 1M) PARALLEL NOLOGGING CACHE"
        );
        assert!(commands[2].starts_with("CREATE OR REPLACE TRIGGER FOO_ID_TRG"));
    }

    #[test]
    fn test_index_organized_only_for_oracle() {
        let mut table = TableSpec::new("T").with_column(ColumnSpec::new("A", "INTEGER"));
        table.index_organized = true;
        let types = TypeMaps::new();
        assert_eq!(
            table.create_commands(&types, Dialect::Oracle).unwrap(),
            vec!["CREATE TABLE T (A INTEGER) ORGANIZATION INDEX"]
        );
        assert_eq!(
            table.create_commands(&types, Dialect::H2).unwrap(),
            vec!["CREATE TABLE T (A INTEGER)"]
        );
    }

    #[test]
    fn test_generic_engine_option() {
        let mut table = TableSpec::new("T").with_column(ColumnSpec::new("A", "INTEGER"));
        table.engine = Some("InnoDB".to_string());
        assert_eq!(
            table.create_commands(&TypeMaps::new(), Dialect::Generic).unwrap(),
            vec!["CREATE TABLE T (A INTEGER) ENGINE=InnoDB"]
        );
    }

    #[test]
    fn test_create_commands_are_deterministic() {
        let table = foo();
        let types = TypeMaps::new();
        for dialect in Dialect::ALL {
            assert_eq!(
                table.create_commands(&types, dialect).unwrap(),
                table.create_commands(&types, dialect).unwrap()
            );
        }
    }

    #[test]
    fn test_long_table_name_rejected() {
        let table = TableSpec::new("A_TABLE_NAME_THAT_IS_FAR_TOO_LONG").with_column(ColumnSpec::new("A", "INTEGER"));
        let err = table.create_commands(&TypeMaps::new(), Dialect::Postgres).unwrap_err();
        assert!(matches!(err, DbSetupError::NameTooLong { kind: "Table", .. }));
    }

    #[test]
    fn test_drop_commands_include_sequence_cleanup() {
        let types = TypeMaps::new();
        assert_eq!(
            foo().drop_commands(&types, Dialect::Postgres),
            vec!["DROP TABLE FOO", "DROP SEQUENCE FOO_ID_SEQ"]
        );
        assert_eq!(foo().drop_commands(&types, Dialect::SqlServer), vec!["DROP TABLE FOO"]);
    }

    #[test]
    fn test_from_element_is_lenient_with_children() {
        let element = Element::new("table")
            .with_attribute("name", "FOO")
            .with_attribute("obsolete", "true")
            .with_child(Element::new("column").with_attribute("name", "A").with_attribute("type", "INTEGER"))
            .with_child(Element::new("column").with_attribute("name", "B"))
            .with_child(Element::new("trigger").with_attribute("name", "X"))
            .with_child(Element::new("data").with_attribute("A", "1"));
        let table = TableSpec::from_element(&element).unwrap();
        assert!(table.obsolete);
        assert!(table.logging);
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_from_element_requires_name() {
        let err = TableSpec::from_element(&Element::new("table")).unwrap_err();
        assert!(matches!(err, DbSetupError::MissingAttribute { .. }));
    }
}
