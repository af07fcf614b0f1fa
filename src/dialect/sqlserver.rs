use super::{
    base_type, keep_size, no_commands, no_constraint_commands, no_schema, no_table_options, plain_default, sized_type,
    Dialect, DialectOps,
};
use crate::schema::column::ColumnContext;
use crate::schema::index::IndexSpec;

/// Widest VARCHAR SQL Server accepts with an explicit length
pub(crate) const MAX_VARCHAR_SIZE: usize = 8000;

pub(super) static OPS: DialectOps = DialectOps {
    size_required,
    effective_size: keep_size,
    type_clause,
    default_clause,
    pre_create: no_commands,
    post_create,
    drop_commands: no_commands,
    on_delete_allowed,
    constraint_post_create: no_constraint_commands,
    table_options: no_table_options,
    index_options,
    numeric_booleans: true,
    metadata_schema: no_schema,
    text_projection,
    table_cleanup: &[],
    identity_insert: Some(identity_insert),
};

fn size_required(native_type: &str) -> bool {
    matches!(
        base_type(native_type).as_str(),
        "VARCHAR" | "NVARCHAR" | "CHAR" | "NCHAR" | "VARBINARY" | "BINARY"
    )
}

fn is_wide_varchar(ctx: &ColumnContext<'_>) -> bool {
    !ctx.native_type.contains('(')
        && base_type(ctx.native_type) == "VARCHAR"
        && ctx.size > MAX_VARCHAR_SIZE
}

fn type_clause(ctx: &ColumnContext<'_>) -> String {
    if is_wide_varchar(ctx) {
        "VARCHAR(MAX)".to_string()
    } else {
        sized_type(ctx.native_type, ctx.size)
    }
}

fn default_clause(ctx: &ColumnContext<'_>) -> Option<String> {
    if ctx.column.default.uses_sequence() {
        Some(format!(
            "IDENTITY({},{})",
            ctx.column.initial, ctx.column.increment
        ))
    } else {
        plain_default(ctx, Dialect::SqlServer, "GETDATE()")
    }
}

/// The declared width survives `VARCHAR(MAX)` as a check constraint
fn post_create(ctx: &ColumnContext<'_>) -> Vec<String> {
    if !is_wide_varchar(ctx) {
        return Vec::new();
    }
    vec![format!(
        "ALTER TABLE {} ADD CHECK (DATALENGTH({}) <= {})",
        ctx.table, ctx.column.name, ctx.size
    )]
}

/// Cascading deletes onto the same table are rejected as cycles
fn on_delete_allowed(table: &str, references: &str) -> bool {
    !table.eq_ignore_ascii_case(references)
}

fn index_options(index: &IndexSpec) -> String {
    super::ignore_condition(index, Dialect::SqlServer);
    String::new()
}

fn text_projection(column: &str) -> String {
    format!("CAST({column} AS NVARCHAR(MAX))")
}

fn identity_insert(table: &str, enabled: bool) -> String {
    format!(
        "SET IDENTITY_INSERT {} {}",
        table,
        if enabled { "ON" } else { "OFF" }
    )
}
