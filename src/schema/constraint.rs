//! Table-level constraints

use super::{referenced_table, Element, NodeKind};
use crate::dialect::Dialect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey {
        fields: Vec<String>,
    },
    ForeignKey {
        local: String,
        references: String,
        on_delete: Option<String>,
    },
}

/// A `<constraint>` declared on a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSpec {
    /// Unnamed constraints render without a `CONSTRAINT name` prefix
    pub name: Option<String>,
    pub kind: ConstraintKind,
}

impl ConstraintSpec {
    pub fn primary_key(name: Option<&str>, fields: &[&str]) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: ConstraintKind::PrimaryKey {
                fields: fields.iter().map(|f| (*f).to_string()).collect(),
            },
        }
    }

    pub fn foreign_key(name: Option<&str>, local: &str, references: &str, on_delete: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            kind: ConstraintKind::ForeignKey {
                local: local.to_string(),
                references: references.to_string(),
                on_delete: on_delete.map(str::to_string),
            },
        }
    }

    /// Build from a `<constraint>` element; `None` when it declares nothing usable
    pub(crate) fn from_element(element: &Element) -> Option<Self> {
        let name = element
            .attr("name")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let kind = element.children.iter().find_map(|child| match child.kind() {
            NodeKind::PrimaryKey => {
                let fields: Vec<String> = child
                    .children
                    .iter()
                    .filter(|f| f.kind() == NodeKind::Field)
                    .filter_map(|f| f.attr("ref").or_else(|| f.attr("name")))
                    .map(str::to_string)
                    .collect();
                (!fields.is_empty()).then_some(ConstraintKind::PrimaryKey { fields })
            }
            NodeKind::ForeignKey => Some(ConstraintKind::ForeignKey {
                local: child.attr("local")?.to_string(),
                references: child.attr("references")?.to_string(),
                on_delete: child.attr("ondelete").map(str::to_string),
            }),
            _ => None,
        })?;

        Some(Self { name, kind })
    }

    /// Fragment placed inside `CREATE TABLE (...)` after the columns
    pub fn create_fragment(&self, table: &str, dialect: Dialect) -> String {
        let prefix = match &self.name {
            Some(name) => format!("CONSTRAINT {name} "),
            None => String::new(),
        };

        match &self.kind {
            ConstraintKind::PrimaryKey { fields } => {
                format!("{prefix}PRIMARY KEY ({})", fields.join(", "))
            }
            ConstraintKind::ForeignKey {
                local,
                references,
                on_delete,
            } => {
                let mut fragment = format!("{prefix}FOREIGN KEY ({local}) REFERENCES {references}");
                if let Some(action) = on_delete {
                    if (dialect.ops().on_delete_allowed)(table, referenced_table(references)) {
                        fragment.push_str(&format!(" ON DELETE {action}"));
                    }
                }
                fragment
            }
        }
    }

    /// Statements to run after the owning `CREATE TABLE`
    pub fn post_create_commands(&self, table: &str, dialect: Dialect) -> Vec<String> {
        (dialect.ops().constraint_post_create)(table, self)
    }
}
