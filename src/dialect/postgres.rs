use super::{
    always, default_type_clause, drop_owned_sequence, index_tablespace, keep_size, no_commands, no_constraint_commands,
    no_schema, no_size_required, plain_default, Dialect, DialectOps, SEQUENCE_CACHE_SIZE,
};
use crate::schema::column::ColumnContext;
use crate::schema::index::IndexSpec;
use crate::schema::table::TableSpec;

pub(super) static OPS: DialectOps = DialectOps {
    size_required: no_size_required,
    effective_size: keep_size,
    type_clause: default_type_clause,
    default_clause,
    pre_create,
    post_create: no_commands,
    drop_commands: drop_owned_sequence,
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

fn default_clause(ctx: &ColumnContext<'_>) -> Option<String> {
    if ctx.column.default.uses_sequence() {
        Some(format!("DEFAULT nextval('{}')", ctx.sequence_name()))
    } else {
        plain_default(ctx, Dialect::Postgres, "CURRENT_TIMESTAMP")
    }
}

fn pre_create(ctx: &ColumnContext<'_>) -> Vec<String> {
    if !ctx.column.default.uses_sequence() {
        return Vec::new();
    }
    vec![format!(
        "CREATE SEQUENCE {} START {} INCREMENT {} CACHE {}",
        ctx.sequence_name(),
        ctx.column.initial,
        ctx.column.increment,
        SEQUENCE_CACHE_SIZE
    )]
}

fn table_options(table: &TableSpec) -> String {
    match &table.tablespace {
        Some(ts) => format!(" TABLESPACE {ts}"),
        None => String::new(),
    }
}

/// Partial indexes are supported, so the condition becomes a `WHERE` clause
fn index_options(index: &IndexSpec) -> String {
    let mut options = index_tablespace(index);
    if let Some(condition) = &index.condition {
        options.push_str(&format!(" WHERE {condition}"));
    }
    options
}

fn text_projection(column: &str) -> String {
    format!("CAST({column} AS TEXT)")
}
