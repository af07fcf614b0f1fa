//! Span constructors used when the `tracing` feature is enabled

use tracing::{info_span, Span};

/// Span covering one public engine operation (setup, clear, uninstall, export)
pub fn operation_span(operation: &str, source: &str) -> Span {
    info_span!("dbsetup.operation", operation = operation, source = source)
}

/// Span covering connection acquisition and dialect resolution
pub fn acquire_connection_span(url: &str) -> Span {
    info_span!("dbsetup.connect", url = url)
}

/// Span covering one executed statement and its commit or rollback
pub fn statement_span(sql: &str) -> Span {
    info_span!("dbsetup.statement", sql = sql)
}
