//! Loading schema documents from files and streams

use dbsetup::{DbSetupError, SchemaDocument};
use std::fs;
use std::path::Path;

fn write(path: &Path, xml: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, xml).unwrap();
}

#[test]
fn test_includes_are_inlined_in_place() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("main.xml"),
        r#"<dbsetup name="main.xml">
            <table name="FIRST"><column name="ID" type="INTEGER"/></table>
            <include file="parts/middle.xml"/>
            <table name="LAST"><column name="ID" type="INTEGER"/></table>
        </dbsetup>"#,
    );
    write(
        &dir.path().join("parts/middle.xml"),
        r#"<dbsetup name="middle.xml">
            <table name="MIDDLE"><column name="ID" type="INTEGER"/></table>
            <include file="nested.xml"/>
        </dbsetup>"#,
    );
    write(
        &dir.path().join("parts/nested.xml"),
        r#"<dbsetup name="nested.xml">
            <view name="NESTED_VIEW"><query>SELECT ID FROM MIDDLE</query></view>
            <table name="NESTED"><column name="ID" type="INTEGER"/></table>
        </dbsetup>"#,
    );

    let document = SchemaDocument::from_path(dir.path().join("main.xml")).unwrap();
    let names: Vec<&str> = document.tables().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["FIRST", "MIDDLE", "NESTED", "LAST"]);
    assert_eq!(document.views().len(), 1);
    assert!(document.table("nested").is_some());
}

#[test]
fn test_include_cycle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("a.xml"),
        r#"<dbsetup name="a.xml"><include file="b.xml"/></dbsetup>"#,
    );
    write(
        &dir.path().join("b.xml"),
        r#"<dbsetup name="b.xml"><include file="a.xml"/></dbsetup>"#,
    );

    let err = SchemaDocument::from_path(dir.path().join("a.xml")).unwrap_err();
    assert!(matches!(err, DbSetupError::IncludeCycle(_)));
}

#[test]
fn test_included_file_must_be_a_dbsetup_document() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("main.xml"),
        r#"<dbsetup name="main.xml"><include file="other.xml"/></dbsetup>"#,
    );
    write(&dir.path().join("other.xml"), r#"<schema><table name="X"/></schema>"#);

    let err = SchemaDocument::from_path(dir.path().join("main.xml")).unwrap_err();
    assert!(matches!(err, DbSetupError::NotDbSetupDocument(_)));
}

#[test]
fn test_missing_include_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("main.xml"),
        r#"<dbsetup name="main.xml"><include file="absent.xml"/></dbsetup>"#,
    );

    let err = SchemaDocument::from_path(dir.path().join("main.xml")).unwrap_err();
    assert!(matches!(err, DbSetupError::Io { .. }));
}

#[test]
fn test_stream_rejects_relative_include() {
    let xml = r#"<dbsetup name="stream"><include file="parts/tables.xml"/></dbsetup>"#;
    let err = SchemaDocument::from_reader(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, DbSetupError::RelativeIncludeFromStream(ref f) if f == "parts/tables.xml"));
}

#[test]
fn test_stream_accepts_absolute_include() {
    let dir = tempfile::tempdir().unwrap();
    let part = dir.path().join("part.xml");
    write(
        &part,
        r#"<dbsetup name="part.xml"><table name="PART"><column name="ID" type="INTEGER"/></table></dbsetup>"#,
    );

    let xml = format!(
        r#"<dbsetup name="stream"><include file="{}"/></dbsetup>"#,
        part.canonicalize().unwrap().display()
    );
    let document = SchemaDocument::from_reader(xml.as_bytes()).unwrap();
    assert_eq!(document.tables()[0].name, "PART");
}

#[test]
fn test_unknown_top_level_element_is_rejected() {
    let xml = r#"<dbsetup name="bad"><sequence name="S"/></dbsetup>"#;
    let err = SchemaDocument::from_reader(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, DbSetupError::UnknownElement { ref element, .. } if element == "sequence"));
}

#[test]
fn test_wrong_root_is_rejected() {
    let err = SchemaDocument::from_reader(r#"<schema/>"#.as_bytes()).unwrap_err();
    assert!(matches!(err, DbSetupError::NotDbSetupDocument(_)));
}

#[test]
fn test_malformed_xml_is_rejected() {
    let err = SchemaDocument::from_reader(r#"<dbsetup><table name="T">"#.as_bytes()).unwrap_err();
    assert!(matches!(err, DbSetupError::Xml { .. }));
}

#[test]
fn test_view_without_query_is_rejected() {
    let xml = r#"<dbsetup name="views"><view name="V"/></dbsetup>"#;
    let err = SchemaDocument::from_reader(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, DbSetupError::MissingAttribute { ref attribute, .. } if attribute == "query"));
}

#[test]
fn test_duplicate_table_across_include_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("main.xml"),
        r#"<dbsetup name="main.xml">
            <table name="FOO"><column name="ID" type="INTEGER"/></table>
            <include file="more.xml"/>
        </dbsetup>"#,
    );
    write(
        &dir.path().join("more.xml"),
        r#"<dbsetup name="more.xml"><table name="foo"><column name="X" type="INTEGER"/></table></dbsetup>"#,
    );

    let err = SchemaDocument::from_path(dir.path().join("main.xml")).unwrap_err();
    assert!(matches!(err, DbSetupError::DuplicateTable { ref name, .. } if name == "foo"));
}
