//! Document loading and include resolution

use super::{NodeKind, TableSpec, ViewSpec};
use crate::error::{DbSetupError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Label used in errors for documents that did not come from a file
pub const STREAM_SOURCE: &str = "<stream>";

/// One parsed XML element
///
/// Only element structure, attributes and text content are kept; comments
/// and processing instructions are dropped while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Attribute value, matching the name case-insensitively
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Boolean attribute; only `true` (any case) is true
    pub fn flag(&self, name: &str) -> bool {
        self.attr(name).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Boolean attribute with an explicit default when absent
    pub fn flag_or(&self, name: &str, default: bool) -> bool {
        match self.attr(name) {
            Some(v) => v.trim().eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::classify(self)
    }

    /// Parse an XML text into its root element
    pub fn parse(xml: &str, source_name: &str) -> Result<Element> {
        let xml_error = |message: String| DbSetupError::Xml {
            source_name: source_name.to_string(),
            message,
        };

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut open: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => open.push(start_element(&start).map_err(xml_error)?),
                Ok(Event::Empty(start)) => {
                    let element = start_element(&start).map_err(xml_error)?;
                    close_element(&mut open, &mut root, element);
                }
                Ok(Event::End(_)) => {
                    if let Some(element) = open.pop() {
                        close_element(&mut open, &mut root, element);
                    }
                }
                Ok(Event::Text(text)) => {
                    if let Some(current) = open.last_mut() {
                        let text = text.unescape().map_err(|e| xml_error(e.to_string()))?;
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(current) = open.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(xml_error(format!(
                        "{} at position {}",
                        e,
                        reader.error_position()
                    )))
                }
            }
        }

        if !open.is_empty() {
            return Err(xml_error("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| xml_error("document has no root element".to_string()))
    }
}

fn start_element(start: &BytesStart<'_>) -> std::result::Result<Element, String> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn close_element(open: &mut [Element], root: &mut Option<Element>, element: Element) {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Inline every `<include file="..."/>` under `root`
///
/// `origin` is the file `root` was read from. Relative include paths are
/// resolved against its directory; with no origin (a stream source) they
/// are rejected. Included documents must themselves be `<dbsetup>` roots;
/// their children replace the include element in place, recursively. An
/// include chain that revisits a file already being read is an error.
pub fn resolve_includes(root: Element, origin: Option<&Path>) -> Result<Element> {
    let mut chain = Vec::new();
    if let Some(path) = origin {
        chain.push(canonical(path)?);
    }
    resolve(root, origin, &mut chain)
}

fn resolve(root: Element, origin: Option<&Path>, chain: &mut Vec<PathBuf>) -> Result<Element> {
    let Element {
        name,
        attributes,
        children,
        text,
    } = root;

    let mut resolved = Vec::with_capacity(children.len());
    for child in children {
        if child.kind() != NodeKind::Include {
            resolved.push(child);
            continue;
        }

        let file = child.attr("file").ok_or_else(|| DbSetupError::MissingAttribute {
            element: child.name.clone(),
            attribute: "file".to_string(),
        })?;
        let path = include_path(file, origin)?;
        let canonical_path = canonical(&path)?;
        if chain.contains(&canonical_path) {
            return Err(DbSetupError::IncludeCycle(canonical_path));
        }

        log::debug!("Including {}", path.display());
        let included = read_root(&path)?;
        chain.push(canonical_path);
        let included = resolve(included, Some(path.as_path()), chain)?;
        chain.pop();
        resolved.extend(included.children);
    }

    Ok(Element {
        name,
        attributes,
        children: resolved,
        text,
    })
}

fn include_path(file: &str, origin: Option<&Path>) -> Result<PathBuf> {
    let path = PathBuf::from(file);
    if path.is_absolute() {
        return Ok(path);
    }
    match origin {
        Some(origin) => Ok(origin.parent().unwrap_or_else(|| Path::new("")).join(path)),
        None => Err(DbSetupError::RelativeIncludeFromStream(file.to_string())),
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().map_err(|e| DbSetupError::io(path, e))
}

fn read_root(path: &Path) -> Result<Element> {
    let xml = std::fs::read_to_string(path).map_err(|e| DbSetupError::io(path, e))?;
    let source_name = path.display().to_string();
    let root = Element::parse(&xml, &source_name)?;
    if root.kind() != NodeKind::Root {
        return Err(DbSetupError::NotDbSetupDocument(source_name));
    }
    Ok(root)
}

/// A parsed and include-resolved schema document
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    source_name: String,
    tables: Vec<TableSpec>,
    views: Vec<ViewSpec>,
}

impl SchemaDocument {
    /// Load a document from a file; relative includes resolve against its directory
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let root = read_root(path)?;
        let root = resolve_includes(root, Some(path))?;
        Self::from_root(root, path.display().to_string())
    }

    /// Load a document from a stream; only absolute includes are allowed
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut xml = String::new();
        reader
            .read_to_string(&mut xml)
            .map_err(|e| DbSetupError::io(STREAM_SOURCE, e))?;
        let root = Element::parse(&xml, STREAM_SOURCE)?;
        if root.kind() != NodeKind::Root {
            return Err(DbSetupError::NotDbSetupDocument(STREAM_SOURCE.to_string()));
        }
        let root = resolve_includes(root, None)?;
        Self::from_root(root, STREAM_SOURCE.to_string())
    }

    /// Build the model from an already include-resolved root
    pub fn from_root(root: Element, source_name: String) -> Result<Self> {
        let mut tables: Vec<TableSpec> = Vec::new();
        let mut views = Vec::new();
        let mut seen = HashSet::new();

        for child in &root.children {
            match child.kind() {
                NodeKind::Table => {
                    let table = TableSpec::from_element(child)?;
                    if !seen.insert(table.name.to_lowercase()) {
                        return Err(DbSetupError::DuplicateTable {
                            name: table.name,
                            source_name,
                        });
                    }
                    tables.push(table);
                }
                NodeKind::View => views.push(ViewSpec::from_element(child)?),
                _ => {
                    return Err(DbSetupError::UnknownElement {
                        element: child.name.clone(),
                        source_name,
                    })
                }
            }
        }

        Ok(Self {
            source_name,
            tables,
            views,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Tables in declaration order
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Views in declaration order
    pub fn views(&self) -> &[ViewSpec] {
        &self.views
    }

    /// Table by name, case-insensitively
    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}
