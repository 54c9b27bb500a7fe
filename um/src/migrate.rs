//! Migration orchestrator
//!
//! Runs the pipeline start to finish: load config, read the source table,
//! classify and reshape the rows, reconcile the destination schema, upsert.
//! The first error aborts the run; nothing is retried or resumed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::classify::{self, RIGHTS_COLUMN, Role, UNIQUE_ID_COLUMN};
use crate::config::{Config, ConnectionSpec};
use crate::db::{Connection, Connector, sql};
use crate::error::{MigrateError, Result};
use crate::rowset::{RowSet, Value};
use crate::schema::{self, ROLE_COLUMN_TYPE};

/// Pre-existing source column repurposed to hold the computed role
pub const MARKER_COLUMN: &str = "Doctor";

/// Output column holding the role
pub const USER_ROLE_COLUMN: &str = "UserRole";

/// Output column holding the derived type
pub const USER_TYPE_COLUMN: &str = "UserType";

/// Transient column holding the role until it replaces the marker column
const ROLE_TEMP_COLUMN: &str = "UserRole_Temp";

/// Columns that never reach the destination
pub const OBSOLETE_COLUMNS: [&str; 3] = [RIGHTS_COLUMN, UNIQUE_ID_COLUMN, MARKER_COLUMN];

/// Pipeline position. Advances strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    ConfigLoaded,
    Validated,
    SourceConnected,
    DataFetched,
    Classified,
    Reshaped,
    DestConnected,
    SchemaReconciled,
    Upserted,
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ConfigLoaded => "config-loaded",
            Self::Validated => "validated",
            Self::SourceConnected => "source-connected",
            Self::DataFetched => "data-fetched",
            Self::Classified => "classified",
            Self::Reshaped => "reshaped",
            Self::DestConnected => "destination-connected",
            Self::SchemaReconciled => "schema-reconciled",
            Self::Upserted => "upserted",
            Self::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub table: String,
    pub rows_read: usize,
    pub rows_written: usize,
    pub columns_dropped: Vec<String>,
    pub columns_added: Vec<String>,
    pub roles: BTreeMap<Role, usize>,
}

/// Drives one migration run against connections opened by `C`
pub struct Migrator<C: Connector> {
    config_path: PathBuf,
    connector: C,
    stage: Stage,
}

impl<C: Connector> Migrator<C> {
    pub fn new(config_path: impl AsRef<Path>, connector: C) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            connector,
            stage: Stage::Init,
        }
    }

    /// Last stage reached; after a failure this is where the run stopped
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        debug_assert!(stage > self.stage);
        self.stage = stage;
    }

    /// Run the whole pipeline
    pub fn run(&mut self) -> Result<MigrationReport> {
        info!("Loading config...");
        let raw = Config::read(&self.config_path)?;
        self.advance(Stage::ConfigLoaded);

        let config = Config::from_value(raw)?;
        self.advance(Stage::Validated);

        let table = config.table.as_str();
        let mut report = MigrationReport {
            table: table.to_string(),
            ..Default::default()
        };

        let mut src = self.connect(&config.source, "source")?;
        self.advance(Stage::SourceConnected);

        let fetched = src.fetch_all(table);
        let closed = src.close();
        let mut rows = fetched.map_err(|source| MigrateError::Read {
            table: table.to_string(),
            source,
        })?;
        if let Err(e) = closed {
            warn!("Failed to close source connection: {}", e);
        }
        report.rows_read = rows.len();
        info!(rows = rows.len(), "Retrieved rows from source");
        self.advance(Stage::DataFetched);

        info!("Classifying users...");
        report.roles = classify_rows(&mut rows);
        info!("Classification complete");
        self.advance(Stage::Classified);

        reshape(&mut rows)?;
        self.advance(Stage::Reshaped);

        let mut dst = self.connect(&config.destination, "destination")?;
        self.advance(Stage::DestConnected);

        report.columns_dropped = schema::drop_columns_if_present(dst.as_mut(), table, &OBSOLETE_COLUMNS)?;
        report.columns_added = schema::ensure_columns_exist(
            dst.as_mut(),
            table,
            &[(USER_ROLE_COLUMN, ROLE_COLUMN_TYPE), (USER_TYPE_COLUMN, ROLE_COLUMN_TYPE)],
        )?;
        self.advance(Stage::SchemaReconciled);

        info!(table, "Inserting data into destination table");
        report.rows_written = upsert(dst.as_mut(), table, &rows)?;
        self.advance(Stage::Upserted);

        if let Err(e) = dst.close() {
            warn!("Failed to close destination connection: {}", e);
        }
        self.advance(Stage::Closed);

        info!(rows = report.rows_written, "Data migration and transformation completed");
        Ok(report)
    }

    fn connect(&self, spec: &ConnectionSpec, label: &'static str) -> Result<Box<dyn Connection>> {
        info!("Connecting to {} database...", label);
        let conn = self
            .connector
            .connect(spec)
            .map_err(|source| MigrateError::Connection { label, source })?;
        info!("Connected to {} DB", label);
        Ok(conn)
    }
}

/// Append the transient role column and `UserType` to every row.
/// Returns how many rows landed in each role.
pub fn classify_rows(rows: &mut RowSet) -> BTreeMap<Role, usize> {
    let mut counts = BTreeMap::new();
    let mut roles = Vec::with_capacity(rows.len());
    let mut types = Vec::with_capacity(rows.len());

    for i in 0..rows.len() {
        let c = classify::classify(rows, i);
        *counts.entry(c.role).or_insert(0) += 1;
        roles.push(Value::from(c.role.as_str()));
        types.push(Value::from(c.user_type.as_str()));
    }

    rows.set_column(ROLE_TEMP_COLUMN, roles);
    rows.set_column(USER_TYPE_COLUMN, types);
    counts
}

/// Turn classified rows into the destination shape: the marker column takes
/// the role and becomes `UserRole`, obsolete columns go, and `UserRole` /
/// `UserType` move to the end.
pub fn reshape(rows: &mut RowSet) -> Result<()> {
    if !rows.has_column(MARKER_COLUMN) {
        return Err(MigrateError::Structural {
            column: MARKER_COLUMN.to_string(),
        });
    }

    let roles: Vec<Value> = (0..rows.len())
        .map(|i| rows.get(i, ROLE_TEMP_COLUMN).cloned().unwrap_or(Value::Null))
        .collect();
    rows.set_column(MARKER_COLUMN, roles);
    rows.rename_column(MARKER_COLUMN, USER_ROLE_COLUMN);
    rows.drop_column(ROLE_TEMP_COLUMN);
    info!("Replaced '{}' column with '{}'", MARKER_COLUMN, USER_ROLE_COLUMN);

    for column in OBSOLETE_COLUMNS {
        if rows.drop_column(column) {
            info!(column, "Dropped column from data");
        } else {
            warn!(column, "Column not found in data");
        }
    }

    rows.move_to_end(&[USER_ROLE_COLUMN, USER_TYPE_COLUMN]);
    Ok(())
}

/// Write every row with replace semantics inside one transaction.
/// On failure the transaction is rolled back and nothing is committed.
pub fn upsert(conn: &mut dyn Connection, table: &str, rows: &RowSet) -> Result<usize> {
    let statement = sql::replace_into(table, rows.columns());
    let tx_err = |action, source| MigrateError::Transaction {
        table: table.to_string(),
        action,
        source,
    };

    conn.begin().map_err(|e| tx_err("begin", e))?;

    for (i, row) in rows.rows().iter().enumerate() {
        if let Err(e) = conn.execute(&statement, row) {
            if let Err(rb) = conn.rollback() {
                warn!("Rollback failed: {}", rb);
            }
            return Err(MigrateError::Write {
                table: table.to_string(),
                row: i,
                source: e,
            });
        }
    }

    conn.commit().map_err(|e| tx_err("commit", e))?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    /// Records calls and fails the transaction step it is told to
    #[derive(Default)]
    struct ScriptedConnection {
        fail_begin: bool,
        fail_commit: bool,
        executed: usize,
        rolled_back: bool,
    }

    fn refused() -> DbError {
        DbError::Io(std::io::Error::other("server has gone away"))
    }

    impl Connection for ScriptedConnection {
        fn columns(&mut self, _table: &str) -> std::result::Result<Vec<String>, DbError> {
            Ok(vec![])
        }

        fn fetch_all(&mut self, _table: &str) -> std::result::Result<RowSet, DbError> {
            Ok(RowSet::default())
        }

        fn execute(&mut self, _sql: &str, _params: &[Value]) -> std::result::Result<u64, DbError> {
            self.executed += 1;
            Ok(1)
        }

        fn begin(&mut self) -> std::result::Result<(), DbError> {
            if self.fail_begin { Err(refused()) } else { Ok(()) }
        }

        fn commit(&mut self) -> std::result::Result<(), DbError> {
            if self.fail_commit { Err(refused()) } else { Ok(()) }
        }

        fn rollback(&mut self) -> std::result::Result<(), DbError> {
            self.rolled_back = true;
            Ok(())
        }

        fn close(self: Box<Self>) -> std::result::Result<(), DbError> {
            Ok(())
        }
    }

    fn destination_rows() -> RowSet {
        RowSet::new(
            vec!["Name".into(), USER_ROLE_COLUMN.into(), USER_TYPE_COLUMN.into()],
            vec![
                vec!["Jane".into(), "Lawyer".into(), "External".into()],
                vec!["Ann".into(), "Admin".into(), "Internal".into()],
            ],
        )
    }

    fn source() -> RowSet {
        RowSet::new(
            vec!["Doctor".into(), "Rights".into(), "UniqueID".into(), "Name".into()],
            vec![
                vec!["x".into(), "lawyer".into(), "".into(), "Jane".into()],
                vec![Value::Null, "SuperAdmin".into(), "SuperUser".into(), "Ann".into()],
            ],
        )
    }

    #[test]
    fn test_classify_rows_appends_transient_columns() {
        let mut rows = source();
        let counts = classify_rows(&mut rows);

        assert_eq!(counts.get(&Role::Lawyer), Some(&1));
        assert_eq!(counts.get(&Role::Admin), Some(&1));
        assert_eq!(rows.columns()[4], ROLE_TEMP_COLUMN);
        assert_eq!(rows.columns()[5], USER_TYPE_COLUMN);
        assert_eq!(rows.get(0, USER_TYPE_COLUMN), Some(&Value::from("External")));
    }

    #[test]
    fn test_reshape_produces_destination_shape() {
        let mut rows = source();
        classify_rows(&mut rows);
        reshape(&mut rows).unwrap();

        assert_eq!(rows.columns(), &["Name", USER_ROLE_COLUMN, USER_TYPE_COLUMN]);
        assert_eq!(
            rows.rows()[0],
            vec![Value::from("Jane"), Value::from("Lawyer"), Value::from("External")]
        );
        assert_eq!(
            rows.rows()[1],
            vec![Value::from("Ann"), Value::from("Admin"), Value::from("Internal")]
        );
    }

    #[test]
    fn test_reshape_requires_marker_column() {
        let mut rows = RowSet::new(vec!["Rights".into(), "Name".into()], vec![vec!["staff".into(), "Bo".into()]]);
        classify_rows(&mut rows);
        let err = reshape(&mut rows).unwrap_err();
        assert!(matches!(err, MigrateError::Structural { ref column } if column == MARKER_COLUMN));
    }

    #[test]
    fn test_reshape_overwrites_existing_user_type() {
        let mut rows = RowSet::new(
            vec!["UserType".into(), "Doctor".into(), "Rights".into(), "Email".into()],
            vec![vec!["stale".into(), "d".into(), "provider".into(), "a@b".into()]],
        );
        classify_rows(&mut rows);
        reshape(&mut rows).unwrap();

        assert_eq!(rows.columns(), &["Email", USER_ROLE_COLUMN, USER_TYPE_COLUMN]);
        assert_eq!(rows.get(0, USER_TYPE_COLUMN), Some(&Value::from("External")));
        assert_eq!(rows.get(0, USER_ROLE_COLUMN), Some(&Value::from("Provider")));
    }

    #[test]
    fn test_reshape_empty_source() {
        let mut rows = RowSet::new(vec!["Doctor".into(), "Rights".into(), "Name".into()], vec![]);
        classify_rows(&mut rows);
        reshape(&mut rows).unwrap();
        assert_eq!(rows.columns(), &["Name", USER_ROLE_COLUMN, USER_TYPE_COLUMN]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_begin_failure_is_transaction_error_and_writes_nothing() {
        let mut conn = ScriptedConnection {
            fail_begin: true,
            ..Default::default()
        };
        let err = upsert(&mut conn, "users", &destination_rows()).unwrap_err();

        assert!(matches!(err, MigrateError::Transaction { action: "begin", .. }));
        assert!(err.to_string().starts_with("Failed to begin transaction on 'users'"));
        assert_eq!(conn.executed, 0);
    }

    #[test]
    fn test_commit_failure_is_transaction_error() {
        let mut conn = ScriptedConnection {
            fail_commit: true,
            ..Default::default()
        };
        let err = upsert(&mut conn, "users", &destination_rows()).unwrap_err();

        assert!(matches!(err, MigrateError::Transaction { action: "commit", .. }));
        assert_eq!(conn.executed, 2);
    }

    #[test]
    fn test_upsert_commits_every_row() {
        let mut conn = ScriptedConnection::default();
        assert_eq!(upsert(&mut conn, "users", &destination_rows()).unwrap(), 2);
        assert_eq!(conn.executed, 2);
        assert!(!conn.rolled_back);
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Init < Stage::ConfigLoaded);
        assert!(Stage::SchemaReconciled < Stage::Upserted);
        assert_eq!(Stage::DestConnected.to_string(), "destination-connected");
    }
}
