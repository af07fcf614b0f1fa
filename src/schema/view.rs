use super::{Element, NodeKind};
use crate::error::{DbSetupError, Result};

/// A named query exposed as a view; the query text is used verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSpec {
    pub name: String,
    pub query: String,
}

impl ViewSpec {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }

    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        let name = element.attr("name").ok_or_else(|| DbSetupError::MissingAttribute {
            element: element.name.clone(),
            attribute: "name".to_string(),
        })?;
        let query = element
            .children
            .iter()
            .find(|child| child.kind() == NodeKind::Query)
            .map(|child| child.text.trim())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| DbSetupError::MissingAttribute {
                element: element.name.clone(),
                attribute: "query".to_string(),
            })?;
        Ok(Self::new(name, query))
    }

    pub fn create_command(&self) -> String {
        format!("CREATE VIEW {} AS {}", self.name, self.query)
    }

    pub fn drop_command(&self) -> String {
        format!("DROP VIEW {}", self.name)
    }
}
