//! SQLite backend
//!
//! Each [`ConnectionSpec::database`] maps to a `<database>.db` file under the
//! connector's root directory; host and credentials are ignored.

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Connection, Connector};
use crate::config::ConnectionSpec;
use crate::error::DbError;
use crate::rowset::{RowSet, Value};

/// Opens [`SqliteConnection`]s from files under a root directory
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    root: PathBuf,
}

impl SqliteConnector {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of the file backing `database`
    pub fn path_for(&self, database: &str) -> PathBuf {
        self.root.join(format!("{}.db", database))
    }
}

impl Connector for SqliteConnector {
    fn connect(&self, spec: &ConnectionSpec) -> Result<Box<dyn Connection>, DbError> {
        let path = self.path_for(&spec.database);
        if !path.exists() {
            return Err(DbError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Unknown database '{}'", spec.database),
            )));
        }
        Ok(Box::new(SqliteConnection::open(path)?))
    }
}

pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = rusqlite::Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Opened SQLite connection");
        Ok(Self { conn })
    }
}

impl Connection for SqliteConnection {
    fn columns(&mut self, table: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    fn fetch_all(&mut self, table: &str) -> Result<RowSet, DbError> {
        let query = super::sql::select_all(table);
        debug!(%query, "Fetching rows");

        let mut stmt = self.conn.prepare(&query)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(from_sqlite))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(RowSet::new(columns, rows))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        debug!(sql, params = params.len(), "Executing statement");
        let affected = self.conn.execute(sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn begin(&mut self) -> Result<(), DbError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), DbError> {
        self.conn.close().map_err(|(_, e)| DbError::Sqlite(e))
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Int(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::UInt(v) => match i64::try_from(*v) {
                Ok(v) => ToSqlOutput::Borrowed(ValueRef::Integer(v)),
                Err(_) => ToSqlOutput::Owned(rusqlite::types::Value::Text(v.to_string())),
            },
            Value::Float(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch() -> (TempDir, SqliteConnection) {
        let temp = TempDir::new().unwrap();
        let conn = SqliteConnection::open(temp.path().join("scratch.db")).unwrap();
        conn.conn
            .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, Name TEXT, Score REAL, Avatar BLOB)")
            .unwrap();
        (temp, conn)
    }

    #[test]
    fn test_columns_and_fetch_all() {
        let (_temp, mut conn) = scratch();
        conn.execute(
            "INSERT INTO users (id, Name, Score, Avatar) VALUES (?, ?, ?, ?)",
            &[Value::Int(1), Value::from("Jane"), Value::Float(1.5), Value::Null],
        )
        .unwrap();

        assert_eq!(conn.columns("users").unwrap(), vec!["id", "Name", "Score", "Avatar"]);

        let set = conn.fetch_all("users").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0, "Name"), Some(&Value::from("Jane")));
        assert_eq!(set.get(0, "Score"), Some(&Value::Float(1.5)));
        assert_eq!(set.get(0, "Avatar"), Some(&Value::Null));
    }

    #[test]
    fn test_fetch_all_empty_table_keeps_columns() {
        let (_temp, mut conn) = scratch();
        let set = conn.fetch_all("users").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.columns().len(), 4);
    }

    #[test]
    fn test_columns_of_missing_table_is_empty() {
        let (_temp, mut conn) = scratch();
        assert!(conn.columns("nope").unwrap().is_empty());
    }

    #[test]
    fn test_rollback_discards_writes() {
        let (_temp, mut conn) = scratch();
        conn.begin().unwrap();
        conn.execute("INSERT INTO users (id, Name) VALUES (?, ?)", &[Value::Int(1), Value::from("x")])
            .unwrap();
        conn.rollback().unwrap();
        assert!(conn.fetch_all("users").unwrap().is_empty());
    }

    #[test]
    fn test_commit_without_transaction_is_noop() {
        let (_temp, mut conn) = scratch();
        conn.commit().unwrap();
    }

    #[test]
    fn test_connector_rejects_unknown_database() {
        let temp = TempDir::new().unwrap();
        let connector = SqliteConnector::new(temp.path());
        let spec = ConnectionSpec {
            host: "localhost".into(),
            user: "u".into(),
            password: "p".into(),
            database: "missing".into(),
        };
        assert!(connector.connect(&spec).is_err());
    }
}
