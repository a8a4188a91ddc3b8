//! # mydba-core
//!
//! Administrative helpers for MySQL-compatible servers.
//!
//! ## Features
//!
//! - **Set-and-verify toggles**: flip `read_only`, `super_read_only` and
//!   `event_scheduler` with a read-back confirmation on the same connection
//! - **Variable reads**: single system variables with a distinct not-found
//!   outcome, or the full `SHOW GLOBAL VARIABLES` table
//! - **Status reads**: numeric `SHOW GLOBAL STATUS` snapshots that can be merged
//! - **Liveness**: a probe that tells a live-but-refusing server apart from a
//!   dead one
//! - **Replication checks**: full row-image binlog verification, source
//!   coordinates and replica status
//!
//! Every helper takes a `&dyn Connection`, so the same code runs against a
//! real server ([`mysql::MySqlConnection`]) or the in-memory
//! [`testing::MockServer`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mydba_core::prelude::*;
//!
//! let conn = MySqlConnection::connect(&ConnectionConfig::new("mysql://root@localhost:3306")).await?;
//!
//! if is_alive(&conn, ALIVE_PROBE).await {
//!     enable_super_read_only(&conn).await?;
//!     let status = read_global_status(&conn).await?;
//!     println!("uptime: {:?}", status.get("Uptime"));
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `mysql` (default) - MySQL/MariaDB backend via mysql_async

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod connection;
pub mod error;
pub mod liveness;
pub mod replication;
pub mod security;
pub mod session;
pub mod status;
pub mod sysvar;
pub mod testing;
pub mod toggle;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;

/// Prelude for common imports
pub mod prelude {
    pub use crate::connection::{Connection, ConnectionConfig};
    pub use crate::error::{ConfirmationFailure, Error, ErrorCategory, Result};
    pub use crate::liveness::{
        is_alive, is_alive_with, ErrorClassifier, ServerReplyClassifier, ALIVE_PROBE,
    };
    pub use crate::replication::{
        check_binlog_format_row_full, show_all_slaves_status, show_master_status,
        show_slave_status, BinlogPosition,
    };
    pub use crate::session::{connection_id, unlock_all_tables};
    pub use crate::status::{
        merge_maps, read_global_status, show_engine_innodb_status, show_global_variables,
        StatusSnapshot,
    };
    pub use crate::sysvar::{get_global_variable, get_variable, Scope};
    pub use crate::toggle::{
        disable_event_scheduler, disable_read_only, disable_super_read_only,
        enable_event_scheduler, enable_read_only, enable_super_read_only, set_flag,
        set_global_and_verify, GlobalFlag, GlobalWrite, Switch, Toggle,
    };
    pub use crate::types::{Row, Value};

    #[cfg(feature = "mysql")]
    pub use crate::mysql::MySqlConnection;
}

pub use error::{Error, Result};
