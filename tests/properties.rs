//! Property tests for DDL generation and row classification

use dbsetup::schema::{ColumnSpec, TableSpec};
use dbsetup::test_helpers::MockDatabase;
use dbsetup::{
    ConnectionConfig, DataRow, DbSetupError, Dialect, RowAction, SchemaDocument, SchemaEngine, SetupOptions,
    TypeMaps,
};
use proptest::prelude::*;

fn identifier(len: std::ops::RangeInclusive<usize>) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[A-Z][A-Z0-9]{{{},{}}}", len.start() - 1, len.end() - 1))
        .expect("valid identifier regex")
}

fn dialect() -> impl Strategy<Value = Dialect> {
    proptest::sample::select(Dialect::ALL.to_vec())
}

fn value() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z0-9']{0,12}").expect("valid value regex")
}

proptest! {
    #[test]
    fn create_commands_are_deterministic(
        table in identifier(1..=20),
        column in identifier(1..=5),
        dialect in dialect(),
    ) {
        let spec = TableSpec::new(table)
            .with_column(ColumnSpec::new(column, "INTEGER").primary_key())
            .with_column(ColumnSpec::new("NAME", "VARCHAR2").with_size(50));
        let types = TypeMaps::new();
        prop_assert_eq!(
            spec.create_commands(&types, dialect).unwrap(),
            spec.create_commands(&types, dialect).unwrap()
        );
    }

    #[test]
    fn long_table_names_fail_before_execution(name in identifier(31..=60)) {
        let xml = format!(
            r#"<dbsetup name="p"><table name="OK"><column name="ID" type="INTEGER"/></table><table name="{name}"><column name="ID" type="INTEGER"/></table></dbsetup>"#
        );
        let document = SchemaDocument::from_reader(xml.as_bytes()).unwrap();
        let db = MockDatabase::new("PostgreSQL 16.2");
        let engine = SchemaEngine::new(db.connector(), ConnectionConfig::new("mock"));

        let err = engine.setup(&document, &SetupOptions::default()).unwrap_err();
        prop_assert!(matches!(err, DbSetupError::NameTooLong { kind: "Table", .. }), "unexpected error: {}", err);
        prop_assert!(db.executed().is_empty());
    }

    #[test]
    fn long_column_names_fail_validation(name in identifier(31..=60), dialect in dialect()) {
        let spec = TableSpec::new("T").with_column(ColumnSpec::new(name, "INTEGER"));
        let err = spec.create_commands(&TypeMaps::new(), dialect).unwrap_err();
        prop_assert!(matches!(err, DbSetupError::NameTooLong { kind: "Column", .. }), "unexpected error: {}", err);
    }

    #[test]
    fn rows_with_keys_become_updates(
        keys in proptest::collection::vec((identifier(1..=8), value()), 1..3),
        sets in proptest::collection::vec((identifier(1..=8), value()), 1..4),
    ) {
        let mut row = DataRow::new();
        for (name, v) in &keys {
            row = row.with(format!("__{name}"), v.clone());
        }
        for (name, v) in &sets {
            row = row.with(name.clone(), v.clone());
        }

        prop_assert_eq!(row.action(), RowAction::Update);
        let sql = row.to_sql("T", Dialect::Postgres).unwrap();
        prop_assert!(sql.starts_with("UPDATE T SET "));
        let (_, conditions) = sql.split_once(" WHERE ").unwrap();
        prop_assert!(!conditions.contains("__"));
        let first_key = &keys[0].0;
        let expected_start = format!("{first_key} = ");
        prop_assert!(conditions.starts_with(&expected_start));
    }

    #[test]
    fn rows_without_keys_become_inserts(
        values in proptest::collection::vec((identifier(1..=8), value()), 1..5),
    ) {
        let mut row = DataRow::new();
        for (name, v) in &values {
            row = row.with(name.clone(), v.clone());
        }

        prop_assert_eq!(row.action(), RowAction::Insert);
        let columns: Vec<&str> = values.iter().map(|(n, _)| n.as_str()).collect();
        let sql = row.to_sql("T", Dialect::H2).unwrap();
        let expected_prefix = format!("INSERT INTO T ({}) VALUES (", columns.join(","));
        prop_assert!(sql.starts_with(&expected_prefix));
    }

    #[test]
    fn boolean_literals_rewritten_only_where_numeric(flag in prop_oneof![Just("true"), Just("FALSE"), Just("True")], dialect in dialect()) {
        let row = DataRow::new().with("FLAG", flag);
        let sql = row.to_sql("T", dialect).unwrap();
        let numeric = matches!(dialect, Dialect::Oracle | Dialect::SqlServer);
        let expected = if !numeric {
            format!("'{flag}'")
        } else if flag.eq_ignore_ascii_case("true") {
            "'1'".to_string()
        } else {
            "'0'".to_string()
        };
        prop_assert!(sql.ends_with(&format!("VALUES ({expected})")), "{}", sql);
    }
}
