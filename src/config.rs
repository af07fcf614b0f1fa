//! Settings
//!
//! [`DbSetupConfig::load`] reads `config/dbsetup.toml` when present and
//! then environment variables prefixed with `DBSETUP` (nested keys are
//! separated by `__`, e.g. `DBSETUP_DATABASE__URL`). Command-line flags
//! override both.
//!
//! ```toml
//! typemap = "config/typemaps.toml"
//!
//! [database]
//! url = "postgresql://localhost:5432/rhq"
//! user = "rhqadmin"
//! password = "rhqadmin"
//! log = "sql"
//! log_file = "dbsetup-sql.log"
//! ```

use crate::connection::{ConnectionConfig, SqlLogConfig, SqlLogLevel, SqlLogTarget};
use crate::error::Result;
use crate::typemap::TypeMaps;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default settings file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/dbsetup.toml";

const ENV_PREFIX: &str = "DBSETUP";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DbSetupConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Type map overrides file
    #[serde(default)]
    pub typemap: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_url")]
    pub url: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Statement log mode: `none`, `all` or `sql`
    #[serde(default)]
    pub log: SqlLogLevel,
    /// Statement log file; stdout when unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            user: None,
            password: None,
            log: SqlLogLevel::None,
            log_file: None,
        }
    }
}

fn default_db_url() -> String {
    "postgresql://localhost:5432/dbsetup".to_string()
}

impl DbSetupConfig {
    /// Load from `config/dbsetup.toml` (optional) and the environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load from the given settings file (optional) and the environment
    ///
    /// A file that exists but cannot be read is reported on stderr and
    /// skipped; the environment alone is used instead.
    pub fn load_from(path: &Path) -> std::result::Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    eprintln!(
                        "Warning: failed to load {}, falling back to env. Error: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        settings.try_deserialize::<DbSetupConfig>().map_err(|e| {
            ConfigError::Message(format!(
                "dbsetup configuration could not be loaded from file or environment: {}",
                e
            ))
        })
    }

    /// Connection settings, including the statement log
    pub fn connection_config(&self) -> ConnectionConfig {
        let db = &self.database;
        let target = match &db.log_file {
            Some(path) => SqlLogTarget::File(path.clone()),
            None => SqlLogTarget::Stdout,
        };
        ConnectionConfig::new(db.url.clone())
            .with_credentials(db.user.clone(), db.password.clone())
            .with_sql_log(SqlLogConfig {
                level: db.log,
                target,
            })
    }

    /// Built-in type maps, with the configured overrides file applied
    pub fn type_maps(&self) -> Result<TypeMaps> {
        match &self.typemap {
            Some(path) => TypeMaps::load(path),
            None => Ok(TypeMaps::new()),
        }
    }
}
