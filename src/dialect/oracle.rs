use super::{
    always, base_type, default_type_clause, drop_owned_sequence, index_tablespace, no_constraint_commands, plain_default,
    uppercase_user, Dialect, DialectOps, SEQUENCE_CACHE_SIZE,
};
use crate::schema::column::{ColumnContext, ColumnDefault};
use crate::schema::index::IndexSpec;
use crate::schema::table::TableSpec;

pub(super) static OPS: DialectOps = DialectOps {
    size_required,
    effective_size,
    type_clause: default_type_clause,
    default_clause,
    pre_create,
    post_create,
    drop_commands: drop_owned_sequence,
    on_delete_allowed: always,
    constraint_post_create: no_constraint_commands,
    table_options,
    index_options,
    numeric_booleans: true,
    metadata_schema: uppercase_user,
    text_projection,
    table_cleanup: &["PURGE RECYCLEBIN"],
    identity_insert: None,
};

fn size_required(native_type: &str) -> bool {
    matches!(
        base_type(native_type).as_str(),
        "VARCHAR" | "VARCHAR2" | "NVARCHAR2" | "CHAR" | "NCHAR" | "RAW"
    )
}

/// LOB types reject an explicit length
fn effective_size(native_type: &str, size: usize) -> usize {
    match base_type(native_type).as_str() {
        "CLOB" | "NCLOB" | "BLOB" => 0,
        _ => size,
    }
}

fn default_clause(ctx: &ColumnContext<'_>) -> Option<String> {
    plain_default(ctx, Dialect::Oracle, "SYSDATE")
}

fn pre_create(ctx: &ColumnContext<'_>) -> Vec<String> {
    if !ctx.column.default.uses_sequence() {
        return Vec::new();
    }
    vec![format!(
        "CREATE SEQUENCE {} START WITH {} INCREMENT BY {} NOMAXVALUE NOCYCLE CACHE {}",
        ctx.sequence_name(),
        ctx.column.initial,
        ctx.column.increment,
        SEQUENCE_CACHE_SIZE
    )]
}

fn post_create(ctx: &ColumnContext<'_>) -> Vec<String> {
    if ctx.column.default != ColumnDefault::AutoIncrement {
        return Vec::new();
    }
    let column = &ctx.column.name;
    vec![format!(
        "CREATE OR REPLACE TRIGGER {table}_{column}_TRG BEFORE INSERT ON {table} FOR EACH ROW \
         WHEN (NEW.{column} IS NULL) BEGIN SELECT {sequence}.NEXTVAL INTO :NEW.{column} FROM DUAL; END;",
        table = ctx.table,
        sequence = ctx.sequence_name(),
    )]
}

fn table_options(table: &TableSpec) -> String {
    let mut options = String::new();
    if table.index_organized {
        options.push_str(" ORGANIZATION INDEX");
    }
    if let Some(ts) = &table.tablespace {
        options.push_str(&format!(" TABLESPACE {ts}"));
    }
    if let Some(storage) = &table.storage_options {
        options.push_str(&format!(" STORAGE({storage})"));
    }
    if table.parallel {
        options.push_str(" PARALLEL");
    }
    if !table.logging {
        options.push_str(" NOLOGGING");
    }
    if table.cache {
        options.push_str(" CACHE");
    }
    options
}

fn index_options(index: &IndexSpec) -> String {
    super::ignore_condition(index, Dialect::Oracle);
    index_tablespace(index)
}

fn text_projection(column: &str) -> String {
    format!("TO_CHAR({column})")
}
