//! Column declarations and their DDL fragments

use super::{referenced_table, Element, MAX_NAME_LENGTH, MAX_SEQUENCE_BASE_LENGTH};
use crate::dialect::Dialect;
use crate::error::{DbSetupError, Result};
use crate::typemap::TypeMaps;

/// How a column gets its value when an insert does not supply one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnDefault {
    #[default]
    None,
    /// Identity-like column fed by the database on insert
    AutoIncrement,
    /// Column whose default is drawn from a generated sequence
    SequenceOnly,
    /// Insert time
    CurrentTime,
    /// Literal default, written unquoted
    Literal(String),
}

impl ColumnDefault {
    /// Parse a `default` attribute value
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return ColumnDefault::None;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "autoincrement" => ColumnDefault::AutoIncrement,
            "sequence-only" => ColumnDefault::SequenceOnly,
            "current_time" => ColumnDefault::CurrentTime,
            _ => ColumnDefault::Literal(value.to_string()),
        }
    }

    /// Whether the column owns a sequence or identity generator
    pub fn uses_sequence(&self) -> bool {
        matches!(self, ColumnDefault::AutoIncrement | ColumnDefault::SequenceOnly)
    }
}

/// One declared column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// Logical type name, mapped to a native type through [`TypeMaps`]
    pub logical_type: String,
    pub size: usize,
    pub primary_key: bool,
    pub required: bool,
    pub default: ColumnDefault,
    pub initial: i64,
    pub increment: i64,
    pub references: Option<String>,
    pub on_delete: Option<String>,
}

/// A column bound to its table, native type and effective size for one dialect
pub struct ColumnContext<'a> {
    pub table: &'a str,
    pub column: &'a ColumnSpec,
    pub native_type: &'a str,
    pub size: usize,
}

impl ColumnContext<'_> {
    /// Name of the sequence generated for this column
    pub fn sequence_name(&self) -> String {
        format!("{}_{}_SEQ", self.table, self.column.name)
    }
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, logical_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_type: logical_type.into(),
            size: 0,
            primary_key: false,
            required: false,
            default: ColumnDefault::None,
            initial: 1,
            increment: 1,
            references: None,
            on_delete: None,
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = default;
        self
    }

    pub fn references(mut self, table: impl Into<String>, on_delete: Option<&str>) -> Self {
        self.references = Some(table.into());
        self.on_delete = on_delete.map(str::to_string);
        self
    }

    /// Build from a `<column>` element; `None` when the element is unusable
    pub(crate) fn from_element(element: &Element) -> Option<Self> {
        let name = element.attr("name").or_else(|| element.attr("ref"))?.trim();
        let logical_type = element.attr("type")?.trim();
        if name.is_empty() || logical_type.is_empty() {
            return None;
        }

        let mut column = ColumnSpec::new(name, logical_type);
        column.size = parse_number(element.attr("size"), 0)?;
        column.initial = parse_number(element.attr("initial"), 1)?;
        column.increment = parse_number(element.attr("increment"), 1)?;
        column.primary_key = element.flag("primarykey");
        column.required = element.flag("required");
        column.default = ColumnDefault::parse(element.attr("default"));
        column.references = element.attr("references").map(str::to_string);
        column.on_delete = element.attr("ondelete").map(str::to_string);
        Some(column)
    }

    /// Bind this column to a table and dialect
    pub fn context<'a>(&'a self, table: &'a str, types: &'a TypeMaps, dialect: Dialect) -> ColumnContext<'a> {
        let native_type = types.native_type(&self.logical_type, dialect);
        ColumnContext {
            table,
            column: self,
            native_type,
            size: (dialect.ops().effective_size)(native_type, self.size),
        }
    }

    /// Check the declaration rules that must hold before any DDL is emitted
    pub fn validate(&self, table: &str, types: &TypeMaps, dialect: Dialect) -> Result<()> {
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(DbSetupError::NameTooLong {
                kind: "Column",
                name: self.name.clone(),
                limit: MAX_NAME_LENGTH,
            });
        }

        let ctx = self.context(table, types, dialect);
        if (dialect.ops().size_required)(ctx.native_type)
            && ctx.size == 0
            && !ctx.native_type.contains('(')
        {
            return Err(DbSetupError::MissingSize {
                table: table.to_string(),
                column: self.name.clone(),
                native_type: ctx.native_type.to_string(),
            });
        }

        if self.default == ColumnDefault::SequenceOnly
            && table.len() + self.name.len() > MAX_SEQUENCE_BASE_LENGTH
        {
            return Err(DbSetupError::SequenceNameTooLong {
                table: table.to_string(),
                column: self.name.clone(),
                limit: MAX_SEQUENCE_BASE_LENGTH,
            });
        }

        if self.on_delete.is_some() && self.references.is_none() {
            return Err(DbSetupError::OnDeleteWithoutReferences {
                table: table.to_string(),
                column: self.name.clone(),
            });
        }

        Ok(())
    }

    /// `name type[(size)] [DEFAULT ...] [NOT NULL] [PRIMARY KEY] [REFERENCES t [ON DELETE x]]`
    pub fn create_fragment(&self, table: &str, types: &TypeMaps, dialect: Dialect) -> Result<String> {
        self.validate(table, types, dialect)?;
        let ops = dialect.ops();
        let ctx = self.context(table, types, dialect);

        let mut fragment = format!("{} {}", self.name, (ops.type_clause)(&ctx));
        if let Some(default) = (ops.default_clause)(&ctx) {
            fragment.push(' ');
            fragment.push_str(&default);
        }
        if self.required {
            fragment.push_str(" NOT NULL");
        }
        if self.primary_key {
            fragment.push_str(" PRIMARY KEY");
        }
        if let Some(references) = &self.references {
            fragment.push_str(&format!(" REFERENCES {references}"));
            if let Some(action) = &self.on_delete {
                if (ops.on_delete_allowed)(table, referenced_table(references)) {
                    fragment.push_str(&format!(" ON DELETE {action}"));
                }
            }
        }
        Ok(fragment)
    }

    /// Statements that must run before the owning `CREATE TABLE`
    pub fn pre_create_commands(&self, table: &str, types: &TypeMaps, dialect: Dialect) -> Vec<String> {
        (dialect.ops().pre_create)(&self.context(table, types, dialect))
    }

    /// Statements that must run after the owning `CREATE TABLE`
    pub fn post_create_commands(&self, table: &str, types: &TypeMaps, dialect: Dialect) -> Vec<String> {
        (dialect.ops().post_create)(&self.context(table, types, dialect))
    }

    /// Cleanup statements run after the owning `DROP TABLE`
    pub fn drop_commands(&self, table: &str, types: &TypeMaps, dialect: Dialect) -> Vec<String> {
        (dialect.ops().drop_commands)(&self.context(table, types, dialect))
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>, default: T) -> Option<T> {
    match value {
        Some(v) => v.trim().parse().ok(),
        None => Some(default),
    }
}
