//! Replication settings and status

use std::collections::BTreeMap;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::sysvar::get_global_variable;
use crate::types::Row;

/// `SHOW SLAVE STATUS`
pub const SHOW_SLAVE_STATUS: &str = "SHOW SLAVE STATUS";

/// `SHOW ALL SLAVES STATUS` (MariaDB multi-source replication)
pub const SHOW_ALL_SLAVES_STATUS: &str = "SHOW ALL SLAVES STATUS";

/// `SHOW MASTER STATUS`
pub const SHOW_MASTER_STATUS: &str = "SHOW MASTER STATUS";

/// Verify the server writes full row images to the binlog.
///
/// `binlog_format` must be `ROW`. `binlog_row_image` must be `FULL`, unless
/// the server predates the setting, in which case row events are always full.
pub async fn check_binlog_format_row_full(conn: &dyn Connection) -> Result<()> {
    let format = get_global_variable(conn, "binlog_format").await?;
    if format != "ROW" {
        return Err(Error::invalid_setting("binlog_format", "ROW", format));
    }

    match get_global_variable(conn, "binlog_row_image").await {
        Ok(image) if image == "FULL" => Ok(()),
        Ok(image) => Err(Error::invalid_setting("binlog_row_image", "FULL", image)),
        // Older servers have no binlog_row_image
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Current binlog coordinates of a source server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinlogPosition {
    /// Binlog file name
    pub file: String,
    /// Position within the file
    pub position: u64,
    /// `Executed_Gtid_Set`, when the server reports one
    pub executed_gtid_set: Option<String>,
}

/// Read `SHOW MASTER STATUS`; `None` when binary logging is disabled
pub async fn show_master_status(conn: &dyn Connection) -> Result<Option<BinlogPosition>> {
    let Some(row) = conn
        .query_one(SHOW_MASTER_STATUS)
        .await
        .map_err(|e| e.context(format!("error to run `{}`", SHOW_MASTER_STATUS)))?
    else {
        return Ok(None);
    };

    let file = row
        .get_by_name("File")
        .or_else(|| row.get(0))
        .and_then(|v| v.as_string())
        .unwrap_or_default();
    if file.is_empty() {
        return Ok(None);
    }

    let position = row
        .get_by_name("Position")
        .or_else(|| row.get(1))
        .and_then(|v| v.as_u64())
        .ok_or_else(|| Error::type_conversion("SHOW MASTER STATUS: Position is not a number"))?;

    let executed_gtid_set = row
        .get_by_name("Executed_Gtid_Set")
        .and_then(|v| v.as_string())
        .filter(|s| !s.is_empty());

    Ok(Some(BinlogPosition {
        file,
        position,
        executed_gtid_set,
    }))
}

/// Read `SHOW SLAVE STATUS`, one map per replication channel
///
/// An empty vector means the server is not configured as a replica.
pub async fn show_slave_status(conn: &dyn Connection) -> Result<Vec<BTreeMap<String, String>>> {
    read_status_rows(conn, SHOW_SLAVE_STATUS).await
}

/// Read `SHOW ALL SLAVES STATUS`, one map per connection
pub async fn show_all_slaves_status(
    conn: &dyn Connection,
) -> Result<Vec<BTreeMap<String, String>>> {
    read_status_rows(conn, SHOW_ALL_SLAVES_STATUS).await
}

async fn read_status_rows(conn: &dyn Connection, sql: &str) -> Result<Vec<BTreeMap<String, String>>> {
    let rows = conn
        .query(sql)
        .await
        .map_err(|e| e.context(format!("error to run `{}`", sql)))?;
    Ok(rows.into_iter().map(row_to_text_map).collect())
}

fn row_to_text_map(row: Row) -> BTreeMap<String, String> {
    row.into_map()
        .into_iter()
        .map(|(column, value)| (column, value.as_string().unwrap_or_default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_row_to_text_map() {
        let row = Row::new(
            vec!["Slave_IO_Running".into(), "Seconds_Behind_Master".into()],
            vec![Value::from("Yes"), Value::Null],
        );
        let map = row_to_text_map(row);

        assert_eq!(map["Slave_IO_Running"], "Yes");
        assert_eq!(map["Seconds_Behind_Master"], "");
    }
}
