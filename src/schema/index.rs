use super::{Element, NodeKind};
use crate::dialect::Dialect;

/// An `<index>` declared on a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub table: String,
    pub fields: Vec<String>,
    pub unique: bool,
    pub tablespace: Option<String>,
    /// Partial-index predicate, only honoured where the dialect supports one
    pub condition: Option<String>,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, table: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            unique: false,
            tablespace: None,
            condition: None,
        }
    }

    /// Build from an `<index>` element; `None` without a name or fields
    pub(crate) fn from_element(element: &Element, table: &str) -> Option<Self> {
        let name = element.attr("name")?.trim();
        let fields: Vec<&str> = element
            .children
            .iter()
            .filter(|f| f.kind() == NodeKind::Field)
            .filter_map(|f| f.attr("name").or_else(|| f.attr("ref")))
            .collect();
        if name.is_empty() || fields.is_empty() {
            return None;
        }

        let mut index = IndexSpec::new(name, table, &fields);
        index.unique = element.flag("unique");
        index.tablespace = element.attr("tablespace").map(str::to_string);
        index.condition = element.attr("condition").map(str::to_string);
        Some(index)
    }

    pub fn create_command(&self, dialect: Dialect) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({}){}",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            self.table,
            self.fields.join(", "),
            (dialect.ops().index_options)(self)
        )
    }
}
