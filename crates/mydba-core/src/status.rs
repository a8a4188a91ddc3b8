//! Global status and variable tables

use std::collections::BTreeMap;
use tracing::trace;

use crate::connection::Connection;
use crate::error::{Error, Result};

/// `SHOW GLOBAL STATUS`
pub const SHOW_GLOBAL_STATUS: &str = "SHOW GLOBAL STATUS";

/// `SHOW GLOBAL VARIABLES`
pub const SHOW_GLOBAL_VARIABLES: &str = "SHOW GLOBAL VARIABLES";

/// `SHOW ENGINE INNODB STATUS`
pub const SHOW_ENGINE_INNODB_STATUS: &str = "SHOW ENGINE INNODB STATUS";

/// Numeric status counters captured at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    counters: BTreeMap<String, i64>,
}

impl StatusSnapshot {
    /// Get a counter by name
    pub fn get(&self, name: &str) -> Option<i64> {
        self.counters.get(name).copied()
    }

    /// Number of counters
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether the snapshot holds no counters
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Iterate counters ordered by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Overlay `other` on top of this snapshot; `other` wins on shared names
    pub fn merge(&self, other: &StatusSnapshot) -> StatusSnapshot {
        StatusSnapshot {
            counters: merge_maps(&self.counters, &other.counters),
        }
    }

    /// Consume into the underlying map
    pub fn into_inner(self) -> BTreeMap<String, i64> {
        self.counters
    }
}

impl From<BTreeMap<String, i64>> for StatusSnapshot {
    fn from(counters: BTreeMap<String, i64>) -> Self {
        Self { counters }
    }
}

impl FromIterator<(String, i64)> for StatusSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self {
            counters: iter.into_iter().collect(),
        }
    }
}

/// Combine two maps; keys in `right` override keys in `left`
pub fn merge_maps<V: Clone>(
    left: &BTreeMap<String, V>,
    right: &BTreeMap<String, V>,
) -> BTreeMap<String, V> {
    let mut merged = left.clone();
    merged.extend(right.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Read every numeric counter of `SHOW GLOBAL STATUS`.
///
/// Rows whose value is not an integer (e.g. `Ssl_cipher`) are skipped. An
/// empty result is an error.
pub async fn read_global_status(conn: &dyn Connection) -> Result<StatusSnapshot> {
    let rows = conn
        .query(SHOW_GLOBAL_STATUS)
        .await
        .map_err(|e| e.context(format!("error to run `{}`", SHOW_GLOBAL_STATUS)))?;

    let mut counters = BTreeMap::new();
    for row in &rows {
        let Some(name) = row.get(0).and_then(|v| v.as_string()) else {
            continue;
        };
        match row.get(1).and_then(|v| v.as_i64()) {
            Some(value) => {
                counters.insert(name, value);
            }
            None => trace!(status = %name, "skipping non-numeric status value"),
        }
    }

    if counters.is_empty() {
        return Err(Error::empty_result(SHOW_GLOBAL_STATUS));
    }
    Ok(StatusSnapshot { counters })
}

/// Read `SHOW GLOBAL VARIABLES` as name → value; NULL values become empty strings
pub async fn show_global_variables(conn: &dyn Connection) -> Result<BTreeMap<String, String>> {
    let rows = conn
        .query(SHOW_GLOBAL_VARIABLES)
        .await
        .map_err(|e| e.context(format!("error to run `{}`", SHOW_GLOBAL_VARIABLES)))?;

    let variables: BTreeMap<String, String> = rows
        .iter()
        .filter_map(|row| {
            let name = row.get(0).and_then(|v| v.as_string())?;
            let value = row.get(1).and_then(|v| v.as_string()).unwrap_or_default();
            Some((name, value))
        })
        .collect();

    if variables.is_empty() {
        return Err(Error::empty_result(SHOW_GLOBAL_VARIABLES));
    }
    Ok(variables)
}

/// Read the InnoDB monitor output (`Status` column of `SHOW ENGINE INNODB STATUS`)
pub async fn show_engine_innodb_status(conn: &dyn Connection) -> Result<String> {
    let row = conn
        .query_one(SHOW_ENGINE_INNODB_STATUS)
        .await
        .map_err(|e| e.context(format!("error to run `{}`", SHOW_ENGINE_INNODB_STATUS)))?
        .ok_or_else(|| Error::empty_result(SHOW_ENGINE_INNODB_STATUS))?;

    row.get_by_name("Status")
        .or_else(|| row.get(2))
        .and_then(|v| v.as_string())
        .ok_or_else(|| Error::empty_result(SHOW_ENGINE_INNODB_STATUS))
}
