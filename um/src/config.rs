//! Migration configuration types and loading

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, Result};

/// Config file used when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Top-level keys that must be present, checked in this order
const REQUIRED_KEYS: [&str; 3] = ["source", "destination", "table"];

/// Connection parameters for one database
///
/// Keys other than these four are ignored.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionSpec {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Source, destination, and the table migrated between them
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub source: ConnectionSpec,
    pub destination: ConnectionSpec,
    pub table: String,
}

impl Config {
    /// Load and validate configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(Self::read(path)?)
    }

    /// Read a config file and parse it as JSON without checking its shape
    pub fn read(path: impl AsRef<Path>) -> Result<serde_json::Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => MigrateError::ConfigNotFound {
                path: path.to_path_buf(),
            },
            _ => MigrateError::ConfigRead {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let raw = serde_json::from_str(&content).map_err(|source| MigrateError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(raw)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> Result<Self> {
        let raw = serde_json::from_str(content).map_err(|source| MigrateError::ConfigParse {
            path: PathBuf::new(),
            source,
        })?;
        Self::from_value(raw)
    }

    /// Check the required keys, then deserialize
    pub fn from_value(raw: serde_json::Value) -> Result<Self> {
        let Some(object) = raw.as_object() else {
            return Err(MigrateError::ConfigValidation(
                "config must be a JSON object".to_string(),
            ));
        };

        if let Some(key) = REQUIRED_KEYS.iter().find(|k| !object.contains_key(**k)) {
            return Err(MigrateError::ConfigValidation(format!(
                "Missing key in config: '{}'",
                key
            )));
        }

        let config: Self =
            serde_json::from_value(raw).map_err(|e| MigrateError::ConfigValidation(e.to_string()))?;

        tracing::info!(table = %config.table, "Configuration validated");
        Ok(config)
    }
}
