//! In-memory server for testing administrative helpers
//!
//! [`MockServer`] implements [`Connection`] over a small model of a MySQL
//! server: global and session variables, status counters, replication
//! status and the handful of statements the helpers in this crate issue.
//! Failures and canned result sets can be injected per statement.
//!
//! # Example
//!
//! ```rust
//! use mydba_core::testing::{MockFailure, MockServer};
//! use mydba_core::toggle::enable_read_only;
//!
//! # tokio_test_block(async {
//! let server = MockServer::with_defaults();
//! enable_read_only(&server).await.unwrap();
//! assert_eq!(server.global("read_only").as_deref(), Some("1"));
//!
//! let denied = MockServer::with_defaults().fail_on(
//!     "SET GLOBAL",
//!     MockFailure::server(1227, "Access denied; you need the SUPER privilege"),
//! );
//! assert!(enable_read_only(&denied).await.is_err());
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::connection::Connection;
use crate::error::{Error, Result, ER_UNKNOWN_SYSTEM_VARIABLE};
use crate::types::{Row, Value};

/// `ER_PARSE_ERROR`
const ER_PARSE_ERROR: u16 = 1064;

/// Variables the server reports as `ON`/`OFF` rather than `1`/`0`
const KEYWORD_FLAGS: [&str; 2] = ["super_read_only", "event_scheduler"];

/// Failure injected for matching statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// The server answers with an error code
    Server {
        /// Server error code
        code: u16,
        /// Server error message
        message: String,
    },
    /// The driver reports a query error without a server code
    Query(String),
    /// The connection drops before an answer arrives
    Connection(String),
}

impl MockFailure {
    /// Server error reply
    pub fn server(code: u16, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    /// Code-less query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Dropped connection
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    fn to_error(&self, sql: &str) -> Error {
        match self {
            Self::Server { code, message } => Error::server(*code, message.clone(), sql),
            Self::Query(message) => Error::query_with_sql(message.clone(), sql),
            Self::Connection(message) => Error::connection(message.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    globals: HashMap<String, String>,
    session: HashMap<String, String>,
    pinned: HashSet<String>,
    status: Vec<(String, String)>,
    replicas: Vec<Vec<(String, String)>>,
    master: Option<(String, u64, String)>,
    innodb_status: String,
    connection_id: u64,
    responses: Vec<(String, Vec<Row>)>,
    failures: Vec<(String, MockFailure)>,
    statements: Vec<String>,
    closed: bool,
}

/// A scriptable in-memory MySQL server
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<State>>,
}

impl MockServer {
    /// Empty server: no variables, no status counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Server preloaded with a typical MySQL 8.0 configuration
    pub fn with_defaults() -> Self {
        Self::new()
            .with_global("read_only", "0")
            .with_global("super_read_only", "OFF")
            .with_global("event_scheduler", "ON")
            .with_global("binlog_format", "ROW")
            .with_global("binlog_row_image", "FULL")
            .with_global("log_bin", "1")
            .with_global("version", "8.0.36")
            .with_global("max_connections", "151")
            .with_session("sql_mode", "STRICT_TRANS_TABLES")
            .with_status("Uptime", "3600")
            .with_status("Questions", "1200")
            .with_status("Threads_connected", "4")
            .with_status("Threads_running", "1")
            .with_status("Com_select", "800")
            .with_status("Ssl_cipher", "")
            .with_master("binlog.000003", 157, "")
            .with_connection_id(42)
    }

    /// Define a global variable
    pub fn with_global(self, name: &str, value: impl Into<String>) -> Self {
        self.state
            .lock()
            .globals
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Define a session-only value (reads fall back to the global one)
    pub fn with_session(self, name: &str, value: impl Into<String>) -> Self {
        self.state
            .lock()
            .session
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Remove a variable, as if the server version had no such setting
    pub fn without_global(self, name: &str) -> Self {
        let mut state = self.state.lock();
        let key = name.to_ascii_lowercase();
        state.globals.remove(&key);
        state.session.remove(&key);
        drop(state);
        self
    }

    /// Accept `SET GLOBAL` on this variable without changing it
    pub fn pin_variable(self, name: &str) -> Self {
        self.state.lock().pinned.insert(name.to_ascii_lowercase());
        self
    }

    /// Append a `SHOW GLOBAL STATUS` row
    pub fn with_status(self, name: &str, value: impl Into<String>) -> Self {
        self.state
            .lock()
            .status
            .push((name.to_string(), value.into()));
        self
    }

    /// Add a replication channel reported by `SHOW SLAVE STATUS`
    pub fn with_replica(self, fields: &[(&str, &str)]) -> Self {
        self.state.lock().replicas.push(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Set the coordinates reported by `SHOW MASTER STATUS`
    pub fn with_master(self, file: &str, position: u64, executed_gtid_set: &str) -> Self {
        self.state.lock().master = Some((file.to_string(), position, executed_gtid_set.to_string()));
        self
    }

    /// Report binary logging as disabled
    pub fn without_master(self) -> Self {
        self.state.lock().master = None;
        self
    }

    /// Set the text of `SHOW ENGINE INNODB STATUS`
    pub fn with_innodb_status(self, text: impl Into<String>) -> Self {
        self.state.lock().innodb_status = text.into();
        self
    }

    /// Set the value of `CONNECTION_ID()`
    pub fn with_connection_id(self, id: u64) -> Self {
        self.state.lock().connection_id = id;
        self
    }

    /// Answer `sql` (exact, case-insensitive) with fixed rows
    pub fn respond_to(self, sql: &str, rows: Vec<Row>) -> Self {
        self.state.lock().responses.push((normalize(sql), rows));
        self
    }

    /// Fail every statement containing `fragment` (case-insensitive)
    pub fn fail_on(self, fragment: &str, failure: MockFailure) -> Self {
        self.state
            .lock()
            .failures
            .push((fragment.to_ascii_lowercase(), failure));
        self
    }

    /// Current global value of a variable
    pub fn global(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .globals
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// Statements received so far, in order
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().statements.clone()
    }

    /// Whether [`Connection::close`] was called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn run(&self, sql: &str) -> Result<Vec<Row>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::connection("connection is closed"));
        }
        state.statements.push(sql.to_string());

        let lowered = sql.to_ascii_lowercase();
        if let Some((_, failure)) = state
            .failures
            .iter()
            .find(|(fragment, _)| lowered.contains(fragment.as_str()))
        {
            return Err(failure.to_error(sql));
        }

        let key = normalize(sql);
        if let Some((_, rows)) = state.responses.iter().find(|(s, _)| *s == key) {
            return Ok(rows.clone());
        }

        state.dispatch(sql, &key)
    }
}

impl State {
    fn dispatch(&mut self, sql: &str, key: &str) -> Result<Vec<Row>> {
        if let Some(assignment) = key.strip_prefix("set global ") {
            return self.set_global(sql, assignment);
        }
        if let Some(rest) = key.strip_prefix("select @@") {
            return self.select_variable(sql, rest);
        }

        match key {
            "select 1" => Ok(vec![Row::new(vec!["1".into()], vec![Value::Int(1)])]),
            "select connection_id() as id" => Ok(vec![Row::new(
                vec!["id".into()],
                vec![Value::UInt(self.connection_id)],
            )]),
            "show global status" => Ok(pairs_to_rows(&self.status)),
            "show global variables" => {
                let sorted: BTreeMap<_, _> = self.globals.iter().collect();
                Ok(sorted
                    .into_iter()
                    .map(|(k, v)| name_value_row(k, v))
                    .collect())
            }
            "show slave status" | "show all slaves status" => Ok(self
                .replicas
                .iter()
                .map(|fields| {
                    let (columns, values) = fields
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                        .unzip();
                    Row::new(columns, values)
                })
                .collect()),
            "show master status" => Ok(self
                .master
                .iter()
                .map(|(file, position, gtids)| {
                    Row::new(
                        vec![
                            "File".into(),
                            "Position".into(),
                            "Binlog_Do_DB".into(),
                            "Binlog_Ignore_DB".into(),
                            "Executed_Gtid_Set".into(),
                        ],
                        vec![
                            Value::from(file.as_str()),
                            Value::UInt(*position),
                            Value::from(""),
                            Value::from(""),
                            Value::from(gtids.as_str()),
                        ],
                    )
                })
                .collect()),
            "show engine innodb status" => Ok(vec![Row::new(
                vec!["Type".into(), "Name".into(), "Status".into()],
                vec![
                    Value::from("InnoDB"),
                    Value::from(""),
                    Value::from(self.innodb_status.as_str()),
                ],
            )]),
            "unlock tables" => Ok(Vec::new()),
            _ => Err(Error::server(
                ER_PARSE_ERROR,
                "You have an error in your SQL syntax",
                sql,
            )),
        }
    }

    fn set_global(&mut self, sql: &str, assignment: &str) -> Result<Vec<Row>> {
        let Some((name, _)) = assignment.split_once('=') else {
            return Err(Error::server(ER_PARSE_ERROR, "You have an error in your SQL syntax", sql));
        };
        let name = name.trim().to_string();
        // keep the caller's spelling of the value
        let value = sql
            .rsplit_once('=')
            .map(|(_, v)| v.trim().trim_matches('\'').to_string())
            .unwrap_or_default();

        if !self.globals.contains_key(&name) {
            return Err(unknown_variable(&name, sql));
        }
        if self.pinned.contains(&name) {
            return Ok(Vec::new());
        }

        let stored = if KEYWORD_FLAGS.contains(&name.as_str()) {
            match value.to_ascii_uppercase().as_str() {
                "1" | "ON" => "ON".to_string(),
                "0" | "OFF" => "OFF".to_string(),
                _ => value,
            }
        } else {
            value
        };
        self.globals.insert(name, stored);
        Ok(Vec::new())
    }

    fn select_variable(&self, sql: &str, rest: &str) -> Result<Vec<Row>> {
        let (scope, tail) = match rest.split_once('.') {
            Some((scope @ ("global" | "session"), tail)) => (scope, tail),
            _ => ("session", rest),
        };
        let name = tail.split_whitespace().next().unwrap_or_default();

        let value = match scope {
            "global" => self.globals.get(name),
            _ => self.session.get(name).or_else(|| self.globals.get(name)),
        };
        match value {
            Some(value) => Ok(vec![Row::new(
                vec!["val".into()],
                vec![Value::from(value.as_str())],
            )]),
            None => Err(unknown_variable(name, sql)),
        }
    }
}

#[async_trait]
impl Connection for MockServer {
    async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.run(sql)
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        self.run(sql).map(|_| 0)
    }

    async fn is_valid(&self) -> bool {
        !self.state.lock().closed
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }
}

fn normalize(sql: &str) -> String {
    sql.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

fn unknown_variable(name: &str, sql: &str) -> Error {
    Error::server(
        ER_UNKNOWN_SYSTEM_VARIABLE,
        format!("Unknown system variable '{}'", name),
        sql,
    )
}

fn name_value_row(name: &str, value: &str) -> Row {
    Row::new(
        vec!["Variable_name".into(), "Value".into()],
        vec![Value::from(name), Value::from(value)],
    )
}

fn pairs_to_rows(pairs: &[(String, String)]) -> Vec<Row> {
    pairs.iter().map(|(k, v)| name_value_row(k, v)).collect()
}
