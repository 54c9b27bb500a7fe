//! Database connection abstraction
//!
//! The migration only needs a handful of blocking operations: introspect a
//! table's columns, read it whole, execute parameterized statements, and
//! manage a single transaction. Backends implement [`Connection`]; a
//! [`Connector`] opens them from a [`ConnectionSpec`].

mod mysql;
pub mod sql;
mod sqlite;

pub use mysql::{MysqlConnection, MysqlConnector};
pub use sqlite::{SqliteConnection, SqliteConnector};

use crate::config::ConnectionSpec;
use crate::error::DbError;
use crate::rowset::{RowSet, Value};

/// A live, synchronous database connection
pub trait Connection {
    /// Column names of `table`, queried live
    fn columns(&mut self, table: &str) -> Result<Vec<String>, DbError>;

    /// Every row and column of `table` in one query
    fn fetch_all(&mut self, table: &str) -> Result<RowSet, DbError>;

    /// Execute one statement with positional parameters, returning affected rows
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError>;

    fn begin(&mut self) -> Result<(), DbError>;

    /// Commit the open transaction; a no-op when none is open
    fn commit(&mut self) -> Result<(), DbError>;

    fn rollback(&mut self) -> Result<(), DbError>;

    /// Release the connection
    fn close(self: Box<Self>) -> Result<(), DbError>;
}

/// Opens connections from connection parameters
pub trait Connector {
    fn connect(&self, spec: &ConnectionSpec) -> Result<Box<dyn Connection>, DbError>;
}

impl<C: Connector + ?Sized> Connector for &C {
    fn connect(&self, spec: &ConnectionSpec) -> Result<Box<dyn Connection>, DbError> {
        (**self).connect(spec)
    }
}

/// True if `name` is among `columns`, ignoring ASCII case
pub fn has_column(columns: &[String], name: &str) -> bool {
    columns.iter().any(|c| c.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_column_ignores_case() {
        let columns = vec!["UserRole".to_string(), "Name".to_string()];
        assert!(has_column(&columns, "userrole"));
        assert!(has_column(&columns, "NAME"));
        assert!(!has_column(&columns, "UserType"));
    }
}
