use super::{
    always, default_type_clause, drop_owned_sequence, keep_size, no_commands, no_constraint_commands, no_size_required,
    no_table_options, plain_default, Dialect, DialectOps, SEQUENCE_CACHE_SIZE,
};
use crate::schema::column::ColumnContext;
use crate::schema::index::IndexSpec;

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
    table_options: no_table_options,
    index_options,
    numeric_booleans: false,
    metadata_schema: public_schema,
    text_projection,
    table_cleanup: &[],
    identity_insert: None,
};

fn default_clause(ctx: &ColumnContext<'_>) -> Option<String> {
    if ctx.column.default.uses_sequence() {
        Some(format!("DEFAULT nextval('{}')", ctx.sequence_name()))
    } else {
        plain_default(ctx, Dialect::H2, "CURRENT_TIMESTAMP")
    }
}

fn pre_create(ctx: &ColumnContext<'_>) -> Vec<String> {
    if !ctx.column.default.uses_sequence() {
        return Vec::new();
    }
    vec![format!(
        "CREATE SEQUENCE {} START WITH {} INCREMENT BY {} CACHE {}",
        ctx.sequence_name(),
        ctx.column.initial,
        ctx.column.increment,
        SEQUENCE_CACHE_SIZE
    )]
}

fn index_options(index: &IndexSpec) -> String {
    super::ignore_condition(index, Dialect::H2);
    String::new()
}

fn text_projection(column: &str) -> String {
    format!("CAST({column} AS VARCHAR)")
}

/// Unqualified objects live in `PUBLIC` regardless of the login user
fn public_schema(_user: Option<&str>) -> Option<String> {
    Some("PUBLIC".to_string())
}
