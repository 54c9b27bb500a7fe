//! Destination schema reconciliation
//!
//! Columns are added and dropped one at a time against live introspection,
//! each alteration committed before the next. A failure part way through
//! leaves the earlier alterations in place.

use tracing::{info, warn};

use crate::db::{self, Connection, sql};
use crate::error::{MigrateError, Result};

/// Bounded string type used for columns added by the migration
pub const ROLE_COLUMN_TYPE: &str = "VARCHAR(50)";

/// Drop each named column that exists on `table`.
/// Returns the columns actually dropped.
pub fn drop_columns_if_present(conn: &mut dyn Connection, table: &str, names: &[&str]) -> Result<Vec<String>> {
    let mut dropped = Vec::new();

    for &name in names {
        let alter_err = |source| MigrateError::SchemaAlter {
            table: table.to_string(),
            column: name.to_string(),
            source,
        };

        let existing = conn.columns(table).map_err(alter_err)?;
        if !db::has_column(&existing, name) {
            warn!(column = name, "Column not found in the destination table");
            continue;
        }

        conn.execute(&sql::drop_column(table, name), &[]).map_err(alter_err)?;
        conn.commit().map_err(alter_err)?;
        info!(column = name, "Dropped column");
        dropped.push(name.to_string());
    }

    Ok(dropped)
}

/// Add each `(name, type)` column missing from `table`.
/// Returns the columns actually added.
pub fn ensure_columns_exist(conn: &mut dyn Connection, table: &str, columns: &[(&str, &str)]) -> Result<Vec<String>> {
    let mut added = Vec::new();

    for &(name, column_type) in columns {
        let alter_err = |source| MigrateError::SchemaAlter {
            table: table.to_string(),
            column: name.to_string(),
            source,
        };

        let existing = conn.columns(table).map_err(alter_err)?;
        if db::has_column(&existing, name) {
            info!(column = name, "Column already exists");
            continue;
        }

        conn.execute(&sql::add_column(table, name, column_type), &[])
            .map_err(alter_err)?;
        conn.commit().map_err(alter_err)?;
        info!(column = name, column_type, "Added missing column");
        added.push(name.to_string());
    }

    Ok(added)
}
