//! Session-level helpers

use crate::connection::Connection;
use crate::error::{Error, Result};

/// `UNLOCK TABLES`
pub const UNLOCK_TABLES: &str = "UNLOCK TABLES";

/// `SELECT CONNECTION_ID()`
pub const CONNECTION_ID_SQL: &str = "SELECT CONNECTION_ID() AS id";

/// Release every table lock held by this session
pub async fn unlock_all_tables(conn: &dyn Connection) -> Result<()> {
    conn.execute(UNLOCK_TABLES)
        .await
        .map(|_| ())
        .map_err(|e| e.context("error to unlock tables"))
}

/// Server-side id of this session's thread
pub async fn connection_id(conn: &dyn Connection) -> Result<u64> {
    let row = conn
        .query_one(CONNECTION_ID_SQL)
        .await
        .map_err(|e| e.context("error to get connection id"))?
        .ok_or_else(|| Error::empty_result(CONNECTION_ID_SQL))?;

    row.get(0)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| Error::type_conversion("CONNECTION_ID() is not an unsigned integer"))
}
