//! Declarative schema model
//!
//! A [`SchemaDocument`] is parsed once into an immutable [`Element`] tree,
//! has its `<include>` directives inlined by [`resolve_includes`], and is
//! then classified node by node into [`TableSpec`]s and [`ViewSpec`]s.

pub mod column;
pub mod constraint;
pub mod document;
pub mod index;
pub mod table;
pub mod view;

pub use column::{ColumnDefault, ColumnSpec};
pub use constraint::{ConstraintKind, ConstraintSpec};
pub use document::{resolve_includes, Element, SchemaDocument};
pub use index::IndexSpec;
pub use table::TableSpec;
pub use view::ViewSpec;

/// Longest table or column name accepted, for every dialect
pub const MAX_NAME_LENGTH: usize = 30;

/// Longest combined `table` + `column` length for columns that own a sequence
pub const MAX_SEQUENCE_BASE_LENGTH: usize = 25;

/// What a document node is, decided before any model object is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Include,
    Table,
    View,
    Column,
    Index,
    Constraint,
    Data,
    Field,
    PrimaryKey,
    ForeignKey,
    Query,
    Unknown,
}

impl NodeKind {
    /// Classify an element by its (case-insensitive) name
    pub fn classify(element: &Element) -> NodeKind {
        match element.name.to_ascii_lowercase().as_str() {
            "dbsetup" => NodeKind::Root,
            "include" => NodeKind::Include,
            "table" => NodeKind::Table,
            "view" => NodeKind::View,
            "column" => NodeKind::Column,
            "index" => NodeKind::Index,
            "constraint" => NodeKind::Constraint,
            "data" => NodeKind::Data,
            "field" => NodeKind::Field,
            "primarykey" => NodeKind::PrimaryKey,
            "foreignkey" => NodeKind::ForeignKey,
            "query" => NodeKind::Query,
            _ => NodeKind::Unknown,
        }
    }
}

/// Strip a trailing `(col, ...)` from a reference target, leaving the table name
pub(crate) fn referenced_table(references: &str) -> &str {
    references.split('(').next().unwrap_or(references).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str) -> Element {
        Element::new(name)
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(NodeKind::classify(&element("TABLE")), NodeKind::Table);
        assert_eq!(NodeKind::classify(&element("PrimaryKey")), NodeKind::PrimaryKey);
        assert_eq!(NodeKind::classify(&element("dbsetup")), NodeKind::Root);
        assert_eq!(NodeKind::classify(&element("trigger")), NodeKind::Unknown);
    }

    #[test]
    fn test_referenced_table() {
        assert_eq!(referenced_table("RHQ_RESOURCE(ID)"), "RHQ_RESOURCE");
        assert_eq!(referenced_table("RHQ_AGENT"), "RHQ_AGENT");
    }
}
