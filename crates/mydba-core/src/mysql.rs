//! MySQL backend implementation for mydba-core
//!
//! A [`Connection`] over a single `mysql_async` connection. Statements go over
//! the text protocol. The inner driver connection is returned to the handle on
//! every exit path so a failed statement never strands it.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::connection::{Connection, ConnectionConfig};
use crate::error::{Error, Result};
use crate::types::{Row, Value};

/// Convert a MySQL value to a mydba Value
fn mysql_value_to_value(val: mysql_async::Value) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(b) => match String::from_utf8(b) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(n) => Value::Int(n),
        mysql_async::Value::UInt(n) => Value::UInt(n),
        mysql_async::Value::Float(f) => Value::Float(f64::from(f)),
        mysql_async::Value::Double(d) => Value::Float(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let mut s = format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, min, sec
            );
            if micro > 0 {
                s.push_str(&format!(".{:06}", micro));
            }
            Value::String(s)
        }
        mysql_async::Value::Time(neg, days, hour, min, sec, micro) => {
            let hours = days * 24 + u32::from(hour);
            let mut s = format!(
                "{}{:02}:{:02}:{:02}",
                if neg { "-" } else { "" },
                hours,
                min,
                sec
            );
            if micro > 0 {
                s.push_str(&format!(".{:06}", micro));
            }
            Value::String(s)
        }
    }
}

fn mysql_row_to_row(row: mysql_async::Row) -> Row {
    let columns: Vec<String> = row
        .columns_ref()
        .iter()
        .map(|c| c.name_str().to_string())
        .collect();

    let values: Vec<Value> = (0..row.len())
        .map(|i| {
            let val: mysql_async::Value = row.get(i).unwrap_or(mysql_async::Value::NULL);
            mysql_value_to_value(val)
        })
        .collect();

    Row::new(columns, values)
}

/// Map a driver error, keeping the server error code when there is one
fn map_mysql_error(err: mysql_async::Error, sql: &str) -> Error {
    match err {
        mysql_async::Error::Server(ref server) => Error::Query {
            message: format!("ERROR {} ({}): {}", server.code, server.state, server.message),
            sql: Some(sql.to_string()),
            code: Some(server.code),
            source: Some(Box::new(err)),
        },
        mysql_async::Error::Io(_) | mysql_async::Error::Driver(_) => {
            Error::connection_with_source(format!("Failed to execute `{}`", sql), err)
        }
        other => Error::Query {
            message: format!("Failed to execute query: {}", other),
            sql: Some(sql.to_string()),
            code: None,
            source: Some(Box::new(other)),
        },
    }
}

/// MySQL connection implementation
pub struct MySqlConnection {
    conn: Mutex<Option<Conn>>,
    database: String,
}

impl MySqlConnection {
    /// Create a new MySQL connection from an existing connection
    pub fn new(conn: Conn, database: String) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            database,
        }
    }

    /// Create a new connection from configuration
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let url = url::Url::parse(&config.url)
            .map_err(|e| Error::config(format!("Invalid MySQL URL: {}", e)))?;

        let opts = OptsBuilder::from_opts(
            Opts::from_url(&config.url)
                .map_err(|e| Error::config(format!("Invalid MySQL connection string: {}", e)))?,
        );

        let database = url.path().trim_start_matches('/').to_string();

        debug!(url = %config.redacted_url(), "connecting to MySQL");

        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let conn = match tokio::time::timeout(timeout, Conn::new(opts)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(Error::connection_with_source(
                    format!("Failed to connect to MySQL at {}", config.redacted_url()),
                    e,
                ))
            }
            Err(_) => {
                return Err(Error::timeout(format!(
                    "connecting to {} took longer than {:?}",
                    config.redacted_url(),
                    timeout
                )))
            }
        };

        Ok(Self::new(conn, database))
    }

    /// Get the database name this connection is connected to
    pub fn database(&self) -> &str {
        &self.database
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| Error::connection("Connection not available"))?;

        debug!(sql, "execute");
        conn.query_drop(sql)
            .await
            .map_err(|e| map_mysql_error(e, sql))?;

        Ok(conn.affected_rows())
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| Error::connection("Connection not available"))?;

        debug!(sql, "query");
        let result: Vec<mysql_async::Row> = conn
            .query(sql)
            .await
            .map_err(|e| map_mysql_error(e, sql))?;

        Ok(result.into_iter().map(mysql_row_to_row).collect())
    }

    async fn is_valid(&self) -> bool {
        match self.conn.lock().await.as_mut() {
            Some(conn) => conn.ping().await.is_ok(),
            None => false,
        }
    }

    async fn close(&self) -> Result<()> {
        let taken = self.conn.lock().await.take();
        if let Some(conn) = taken {
            conn.disconnect()
                .await
                .map_err(|e| Error::connection_with_source("Failed to close connection", e))?;
        }
        Ok(())
    }
}
