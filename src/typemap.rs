//! Logical type names to native column types
//!
//! Documents declare columns with dialect-neutral names (`VARCHAR2`,
//! `LONG`, `BOOLEAN`, ...). [`TypeMaps`] turns those into the native type
//! for the resolved dialect. A name with no mapping is used verbatim, so a
//! document may also spell out native types directly.
//!
//! Overrides can be loaded from a TOML file:
//!
//! ```toml
//! [BOOLEAN]
//! oracle = "NUMBER(1)"
//! postgresql = "BOOLEAN"
//! ```

use crate::dialect::Dialect;
use crate::error::{DbSetupError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Built-in mappings, in `Dialect::ALL` order (generic, oracle, postgresql, sqlserver, h2)
const DEFAULTS: &[(&str, [&str; 5])] = &[
    ("BOOLEAN", ["BOOLEAN", "NUMBER(1)", "BOOLEAN", "BIT", "BOOLEAN"]),
    ("SMALLINT", ["SMALLINT", "NUMBER(5)", "SMALLINT", "SMALLINT", "SMALLINT"]),
    ("INTEGER", ["INTEGER", "INTEGER", "INTEGER", "INT", "INTEGER"]),
    ("LONG", ["BIGINT", "NUMBER(19)", "BIGINT", "BIGINT", "BIGINT"]),
    ("DOUBLE", ["DOUBLE PRECISION", "BINARY_DOUBLE", "FLOAT8", "FLOAT", "DOUBLE"]),
    ("NUMERIC", ["NUMERIC", "NUMBER", "NUMERIC", "NUMERIC", "NUMERIC"]),
    ("CHAR", ["CHAR", "CHAR", "CHAR", "CHAR", "CHAR"]),
    ("VARCHAR2", ["VARCHAR", "VARCHAR2", "VARCHAR", "VARCHAR", "VARCHAR"]),
    ("LONGVARCHAR", ["CLOB", "CLOB", "TEXT", "VARCHAR(MAX)", "CLOB"]),
    ("BYTES", ["BLOB", "BLOB", "BYTEA", "VARBINARY(MAX)", "BLOB"]),
    ("LONGVARBINARY", ["BLOB", "BLOB", "BYTEA", "VARBINARY(MAX)", "BLOB"]),
    ("TIMESTAMP", ["TIMESTAMP", "TIMESTAMP", "TIMESTAMP", "DATETIME2", "TIMESTAMP"]),
    ("DATE", ["DATE", "DATE", "DATE", "DATE", "DATE"]),
];

/// Logical type name → native type, per dialect
#[derive(Debug, Clone)]
pub struct TypeMaps {
    types: HashMap<String, HashMap<Dialect, String>>,
}

impl Default for TypeMaps {
    fn default() -> Self {
        let types = DEFAULTS
            .iter()
            .map(|(logical, natives)| {
                let per_dialect = Dialect::ALL
                    .iter()
                    .zip(natives.iter())
                    .map(|(dialect, native)| (*dialect, (*native).to_string()))
                    .collect();
                ((*logical).to_string(), per_dialect)
            })
            .collect();
        Self { types }
    }
}

impl TypeMaps {
    /// Built-in mappings
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in mappings with the overrides from a TOML file applied
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DbSetupError::io(path, e))?;
        let mut maps = Self::default();
        maps.apply_toml(&text, path)?;
        Ok(maps)
    }

    fn apply_toml(&mut self, text: &str, path: &Path) -> Result<()> {
        let overrides: HashMap<String, HashMap<String, String>> =
            toml::from_str(text).map_err(|source| DbSetupError::TypeMap {
                path: path.to_path_buf(),
                source,
            })?;

        for (logical, natives) in overrides {
            for (dialect_name, native) in natives {
                let dialect: Dialect = dialect_name.parse()?;
                self.set(&logical, dialect, native);
            }
        }
        Ok(())
    }

    /// Map `logical` to `native` for `dialect`
    pub fn set(&mut self, logical: &str, dialect: Dialect, native: impl Into<String>) {
        self.types
            .entry(logical.to_ascii_uppercase())
            .or_default()
            .insert(dialect, native.into());
    }

    /// Native type for `logical` under `dialect`; unmapped names pass through unchanged
    pub fn native_type<'a>(&'a self, logical: &'a str, dialect: Dialect) -> &'a str {
        self.types
            .get(&logical.to_ascii_uppercase())
            .and_then(|per_dialect| per_dialect.get(&dialect))
            .map(String::as_str)
            .unwrap_or(logical)
    }
}
