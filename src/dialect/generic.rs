//! ANSI-flavoured fallback for unrecognised databases

use super::{
    always, base_type, default_type_clause, keep_size, no_commands, no_constraint_commands, no_schema, plain_default,
    Dialect, DialectOps,
};
use crate::schema::column::{ColumnContext, ColumnDefault};
use crate::schema::index::IndexSpec;
use crate::schema::table::TableSpec;

pub(super) static OPS: DialectOps = DialectOps {
    size_required,
    effective_size: keep_size,
    type_clause: default_type_clause,
    default_clause,
    pre_create,
    post_create: no_commands,
    drop_commands,
    on_delete_allowed: always,
    constraint_post_create: no_constraint_commands,
    table_options,
    index_options,
    numeric_booleans: false,
    metadata_schema: no_schema,
    text_projection,
    table_cleanup: &[],
    identity_insert: None,
};

fn size_required(native_type: &str) -> bool {
    matches!(
        base_type(native_type).as_str(),
        "VARCHAR" | "VARCHAR2" | "NVARCHAR" | "NVARCHAR2" | "CHAR" | "NCHAR" | "VARBINARY" | "RAW"
    )
}

fn default_clause(ctx: &ColumnContext<'_>) -> Option<String> {
    match ctx.column.default {
        ColumnDefault::AutoIncrement => Some(format!(
            "GENERATED BY DEFAULT AS IDENTITY (START WITH {} INCREMENT BY {})",
            ctx.column.initial, ctx.column.increment
        )),
        _ => plain_default(ctx, Dialect::Generic, "CURRENT_TIMESTAMP"),
    }
}

fn pre_create(ctx: &ColumnContext<'_>) -> Vec<String> {
    if ctx.column.default == ColumnDefault::SequenceOnly {
        vec![format!(
            "CREATE SEQUENCE {} START WITH {} INCREMENT BY {}",
            ctx.sequence_name(),
            ctx.column.initial,
            ctx.column.increment
        )]
    } else {
        Vec::new()
    }
}

fn drop_commands(ctx: &ColumnContext<'_>) -> Vec<String> {
    if ctx.column.default == ColumnDefault::SequenceOnly {
        vec![format!("DROP SEQUENCE {}", ctx.sequence_name())]
    } else {
        Vec::new()
    }
}

fn table_options(table: &TableSpec) -> String {
    match &table.engine {
        Some(engine) => format!(" ENGINE={engine}"),
        None => String::new(),
    }
}

fn index_options(index: &IndexSpec) -> String {
    super::ignore_condition(index, Dialect::Generic);
    String::new()
}

fn text_projection(column: &str) -> String {
    column.to_string()
}
