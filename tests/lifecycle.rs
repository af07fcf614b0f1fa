//! Clear, uninstall and export against a scripted in-memory database

use dbsetup::test_helpers::{column_meta, MockConnector, MockDatabase};
use dbsetup::{
    ConnectionConfig, SchemaDocument, SchemaEngine, SetupOptions, SqlError, SqlLogConfig, SqlLogLevel,
    SqlLogTarget,
};
use std::fs;

const SCHEMA: &str = r#"<dbsetup name="lifecycle.xml">
    <table name="A">
        <column name="ID" type="INTEGER" primarykey="true" default="autoincrement"/>
    </table>
    <table name="B">
        <column name="A_ID" type="INTEGER" references="A(ID)"/>
    </table>
    <table name="C">
        <column name="B_ID" type="INTEGER"/>
    </table>
    <view name="V">
        <query>SELECT ID FROM A</query>
    </view>
</dbsetup>"#;

fn document() -> SchemaDocument {
    SchemaDocument::from_reader(SCHEMA.as_bytes()).unwrap()
}

fn engine(db: &MockDatabase) -> SchemaEngine<MockConnector> {
    SchemaEngine::new(db.connector(), ConnectionConfig::new("mock://dbsetup"))
}

#[test]
fn test_clear_runs_in_reverse_declaration_order() {
    let db = MockDatabase::new("PostgreSQL 16.2");
    let report = engine(&db).clear(&document(), None).unwrap();

    assert_eq!(db.executed(), vec!["DELETE FROM C", "DELETE FROM B", "DELETE FROM A"]);
    assert_eq!(report.cleared, 3);
    assert_eq!(report.retried, 0);
    assert!(report.is_success());
}

#[test]
fn test_clear_retries_failures_once() {
    let db = MockDatabase::new("PostgreSQL 16.2");
    db.fail_times("DELETE FROM B", 1, SqlError::new("violates foreign key constraint"));

    let report = engine(&db).clear(&document(), None).unwrap();

    assert_eq!(
        db.executed(),
        vec!["DELETE FROM C", "DELETE FROM B", "DELETE FROM A", "DELETE FROM B"]
    );
    assert_eq!(report.cleared, 3);
    assert_eq!(report.retried, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn test_clear_counts_persistent_failures() {
    let db = MockDatabase::new("PostgreSQL 16.2");
    db.fail_on("DELETE FROM A", SqlError::new("permission denied"));

    let report = engine(&db).clear(&document(), None).unwrap();

    assert_eq!(report.cleared, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.is_success());
    assert_eq!(db.executed().iter().filter(|s| *s == "DELETE FROM A").count(), 2);
}

#[test]
fn test_clear_single_table() {
    let db = MockDatabase::new("PostgreSQL 16.2");
    let report = engine(&db).clear(&document(), Some("b")).unwrap();

    assert_eq!(db.executed(), vec!["DELETE FROM B"]);
    assert_eq!(report.cleared, 1);
}

#[test]
fn test_clear_includes_obsolete_tables() {
    let xml = r#"<dbsetup name="obsolete.xml">
        <table name="OLD" obsolete="true"><column name="ID" type="INTEGER"/></table>
    </dbsetup>"#;
    let document = SchemaDocument::from_reader(xml.as_bytes()).unwrap();
    let db = MockDatabase::new("PostgreSQL 16.2");
    engine(&db).clear(&document, None).unwrap();

    assert_eq!(db.executed(), vec!["DELETE FROM OLD"]);
}

#[test]
fn test_uninstall_drops_views_then_tables_in_reverse() {
    let db = MockDatabase::new("PostgreSQL 16.2");
    let report = engine(&db).uninstall(&document()).unwrap();

    assert_eq!(
        db.executed(),
        vec![
            "DROP VIEW V",
            "DROP TABLE C",
            "DROP TABLE B",
            "DROP TABLE A",
            "DROP SEQUENCE A_ID_SEQ",
        ]
    );
    assert_eq!(report.dropped_views, 1);
    assert_eq!(report.dropped_tables, 3);
    assert!(report.is_success());
}

#[test]
fn test_uninstall_attempts_every_drop_command() {
    let db = MockDatabase::new("PostgreSQL 16.2");
    db.fail_on("DROP VIEW V", SqlError::new("view \"v\" does not exist"));
    db.fail_on("DROP TABLE A", SqlError::new("table \"a\" does not exist"));

    let report = engine(&db).uninstall(&document()).unwrap();

    assert!(db.executed().contains(&"DROP SEQUENCE A_ID_SEQ".to_string()));
    assert_eq!(report.failed_views, 1);
    assert_eq!(report.failed_tables, 1);
    assert_eq!(report.dropped_tables, 2);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures[1].contains("table \"a\" does not exist"));
    assert!(!report.is_success());
}

#[test]
fn test_uninstall_oracle_purges_recycle_bin() {
    let db = MockDatabase::new("Oracle Database 19c Enterprise Edition");
    db.fail_on("PURGE RECYCLEBIN", SqlError::new("insufficient privileges"));

    let report = engine(&db).uninstall(&document()).unwrap();

    assert_eq!(db.executed().last().unwrap(), "PURGE RECYCLEBIN");
    assert!(report.is_success());
}

#[test]
fn test_uninstall_setup_skips_setup_after_failures() {
    let db = MockDatabase::new("PostgreSQL 16.2");
    db.fail_on("DROP TABLE B", SqlError::new("in use"));

    let report = engine(&db)
        .uninstall_setup(&document(), &SetupOptions::default())
        .unwrap();

    assert!(report.setup.is_none());
    assert!(!report.is_success());
    assert!(!db.executed().iter().any(|s| s.starts_with("CREATE")));
}

#[test]
fn test_uninstall_setup_recreates_after_clean_uninstall() {
    let db = MockDatabase::new("PostgreSQL 16.2");
    let report = engine(&db)
        .uninstall_setup(&document(), &SetupOptions::default())
        .unwrap();

    let setup = report.setup.unwrap();
    assert_eq!(setup.tables, 3);
    assert_eq!(setup.views, 1);
    assert_eq!(db.connects(), 2);
    assert_eq!(db.closes(), 2);
}

#[test]
fn test_export_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.xml");

    let db = MockDatabase::new("PostgreSQL 16.2");
    db.with_table(
        "FOO",
        vec![
            column_meta("ID", "integer", 32, false),
            column_meta("NAME", "character varying", 100, true),
        ],
    )
    .with_rows(
        "SELECT CAST(ID AS TEXT), CAST(NAME AS TEXT) FROM FOO",
        vec![
            vec![Some("1".to_string()), Some("bob".to_string())],
            vec![Some("2".to_string()), None],
        ],
    );

    let report = engine(&db).export(&path).unwrap();
    assert_eq!(report.tables, 1);
    assert_eq!(report.rows, 2);
    assert_eq!(db.schema_filters(), vec![None]);

    let xml = fs::read_to_string(&path).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("cannot be used as setup input"));
    assert!(xml.contains("<dbsetup-export name="));
    assert!(xml.contains("<table name=\"FOO\">"));
    assert!(xml.contains("<column name=\"ID\" type=\"integer\" size=\"32\" required=\"true\"/>"));
    assert!(xml.contains("<column name=\"NAME\" type=\"character varying\" size=\"100\"/>"));
    assert!(xml.contains("<data ID=\"1\" NAME=\"bob\"/>"));
    assert!(xml.contains("<data ID=\"2\"/>"));
}

#[test]
fn test_export_uses_dialect_metadata_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db = MockDatabase::new("Oracle Database 19c Enterprise Edition");
    let config = ConnectionConfig::new("mock://dbsetup").with_credentials(Some("rhqadmin".to_string()), None);

    SchemaEngine::new(db.connector(), config)
        .export(dir.path().join("empty.xml"))
        .unwrap();

    assert_eq!(db.schema_filters(), vec![Some("RHQADMIN".to_string())]);
}

#[test]
fn test_statement_log_records_setup() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("sql.log");
    let db = MockDatabase::new("PostgreSQL 16.2");
    let config = ConnectionConfig::new("mock://dbsetup").with_sql_log(SqlLogConfig {
        level: SqlLogLevel::Sql,
        target: SqlLogTarget::File(log_path.clone()),
    });

    SchemaEngine::new(db.connector(), config)
        .setup(&document(), &SetupOptions::default())
        .unwrap();

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("[execute] CREATE TABLE C (B_ID INTEGER)"));
    assert!(log.contains("[execute] CREATE VIEW V AS SELECT ID FROM A"));
    assert!(!log.contains("[commit]"));
}
