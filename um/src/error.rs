//! Error types for the migration pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a database backend
#[derive(Debug, Error)]
pub enum DbError {
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Every way a migration run can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("Config file '{path}' not found")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigValidation(String),

    #[error("Failed to connect to {label} DB: {source}")]
    Connection {
        label: &'static str,
        #[source]
        source: DbError,
    },

    #[error("Failed to read table '{table}': {source}")]
    Read {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("'{column}' column not found in the source table")]
    Structural { column: String },

    #[error("Failed to alter column '{column}' on '{table}': {source}")]
    SchemaAlter {
        table: String,
        column: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to {action} transaction on '{table}': {source}")]
    Transaction {
        table: String,
        action: &'static str,
        #[source]
        source: DbError,
    },

    #[error("Failed to write row {row} into '{table}': {source}")]
    Write {
        table: String,
        row: usize,
        #[source]
        source: DbError,
    },
}

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;
