//! UserMigrate - one-shot user table migration
//!
//! Copies every row of a source user table into a destination table,
//! classifying each user's access rights into a role and a coarse
//! internal/external type on the way.
//!
//! # Pipeline
//!
//! ```text
//! config.json -> source DB -> SELECT * -> classify -> reshape
//!             -> destination DB -> drop/add columns -> REPLACE INTO -> commit
//! ```
//!
//! # Modules
//!
//! - [`classify`] - Role/type classification rules
//! - [`schema`] - Destination column reconciliation
//! - [`migrate`] - Pipeline orchestration, reshape and upsert
//! - [`db`] - Connection abstraction with MySQL and SQLite backends
//! - [`rowset`] - Runtime column-indexed rows
//! - [`config`] - Configuration loading
//!
//! # Example
//!
//! ```ignore
//! use usermigrate::{Migrator, MysqlConnector};
//!
//! let mut migrator = Migrator::new("config.json", MysqlConnector);
//! let report = migrator.run()?;
//! println!("Migrated {} rows", report.rows_written);
//! ```

pub mod classify;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod migrate;
pub mod rowset;
pub mod schema;

pub use classify::{Classification, Role, UserType, classify_fields};
pub use config::{Config, ConnectionSpec, DEFAULT_CONFIG_PATH};
pub use db::{Connection, Connector, MysqlConnector, SqliteConnector};
pub use error::{DbError, MigrateError};
pub use migrate::{MigrationReport, Migrator, Stage};
pub use rowset::{RowSet, Value};
