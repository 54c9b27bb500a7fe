//! MySQL backend
//!
//! `mysql_async` is driven from a private current-thread runtime so callers
//! see plain blocking calls.

use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder, Params, Row};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{Connection, Connector, sql};
use crate::config::ConnectionSpec;
use crate::error::DbError;
use crate::rowset::{RowSet, Value};

const DEFAULT_PORT: u16 = 3306;

/// Opens [`MysqlConnection`]s over TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlConnector;

impl Connector for MysqlConnector {
    fn connect(&self, spec: &ConnectionSpec) -> Result<Box<dyn Connection>, DbError> {
        Ok(Box::new(MysqlConnection::open(spec)?))
    }
}

pub struct MysqlConnection {
    conn: Conn,
    runtime: Runtime,
}

impl MysqlConnection {
    pub fn open(spec: &ConnectionSpec) -> Result<Self, DbError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let opts = OptsBuilder::default()
            .ip_or_hostname(spec.host.clone())
            .tcp_port(DEFAULT_PORT)
            .user(Some(spec.user.clone()))
            .pass(Some(spec.password.clone()))
            .db_name(Some(spec.database.clone()));

        let conn = runtime.block_on(Conn::new(opts))?;
        debug!(host = %spec.host, database = %spec.database, "Opened MySQL connection");
        Ok(Self { conn, runtime })
    }
}

impl Connection for MysqlConnection {
    fn columns(&mut self, table: &str) -> Result<Vec<String>, DbError> {
        let query = sql::show_columns(table);
        debug!(%query, "Introspecting columns");
        let rows: Vec<Row> = self.runtime.block_on(self.conn.query(query))?;
        Ok(rows.into_iter().filter_map(|row| row.get::<String, usize>(0)).collect())
    }

    fn fetch_all(&mut self, table: &str) -> Result<RowSet, DbError> {
        let query = sql::select_all(table);
        debug!(%query, "Fetching rows");

        let conn = &mut self.conn;
        let (columns, rows) = self.runtime.block_on(async move {
            let mut result = conn.exec_iter(query, ()).await?;
            let columns: Vec<String> = result
                .columns_ref()
                .iter()
                .map(|c| c.name_str().into_owned())
                .collect();
            let rows: Vec<Row> = result.collect().await?;
            Ok::<_, mysql_async::Error>((columns, rows))
        })?;

        let rows = rows
            .into_iter()
            .map(|mut row| {
                (0..columns.len())
                    .map(|i| row.take::<mysql_async::Value, usize>(i).map(from_mysql).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Ok(RowSet::new(columns, rows))
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        debug!(sql, params = params.len(), "Executing statement");
        // DDL goes over the text protocol; only parameterized writes are prepared
        if params.is_empty() {
            self.runtime.block_on(self.conn.query_drop(sql))?;
        } else {
            let params = Params::Positional(params.iter().map(to_mysql).collect());
            self.runtime.block_on(self.conn.exec_drop(sql, params))?;
        }
        Ok(self.conn.affected_rows())
    }

    fn begin(&mut self) -> Result<(), DbError> {
        self.runtime.block_on(self.conn.query_drop("START TRANSACTION"))?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.runtime.block_on(self.conn.query_drop("COMMIT"))?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        self.runtime.block_on(self.conn.query_drop("ROLLBACK"))?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), DbError> {
        let Self { conn, runtime } = *self;
        runtime.block_on(conn.disconnect())?;
        Ok(())
    }
}

fn from_mysql(value: mysql_async::Value) -> Value {
    use mysql_async::Value as My;

    match value {
        My::NULL => Value::Null,
        My::Int(v) => Value::Int(v),
        My::UInt(v) => Value::UInt(v),
        My::Float(v) => Value::Float(v as f64),
        My::Double(v) => Value::Float(v),
        My::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        My::Date(y, mo, d, h, mi, s, us) => {
            let mut text = format!("{:04}-{:02}-{:02} {:02}:{:02}:{:02}", y, mo, d, h, mi, s);
            if us > 0 {
                text.push_str(&format!(".{:06}", us));
            }
            Value::Text(text)
        }
        My::Time(neg, days, h, mi, s, us) => {
            let hours = days * 24 + u32::from(h);
            let mut text = format!("{}{:02}:{:02}:{:02}", if neg { "-" } else { "" }, hours, mi, s);
            if us > 0 {
                text.push_str(&format!(".{:06}", us));
            }
            Value::Text(text)
        }
    }
}

fn to_mysql(value: &Value) -> mysql_async::Value {
    use mysql_async::Value as My;

    match value {
        Value::Null => My::NULL,
        Value::Int(v) => My::Int(*v),
        Value::UInt(v) => My::UInt(*v),
        Value::Float(v) => My::Double(*v),
        Value::Text(v) => My::Bytes(v.clone().into_bytes()),
        Value::Bytes(v) => My::Bytes(v.clone()),
    }
}
