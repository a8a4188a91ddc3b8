//! System variable reads

use std::fmt;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::security::validate_variable_name;

/// Scope a system variable is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Server-wide value
    #[default]
    Global,
    /// Value for the current session
    Session,
}

impl Scope {
    /// Keyword used in `@@<scope>.<name>`
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `SELECT @@<scope>.<name> AS val`
///
/// The name is not validated here; callers go through [`get_variable`].
pub fn select_variable_sql(name: &str, scope: Scope) -> String {
    format!("SELECT @@{}.{} AS val", scope.as_sql(), name)
}

/// Read a single system variable as a string.
///
/// An unknown variable yields [`Error::NotFound`], so callers can tell
/// "this server version has no such setting" apart from a failed query. Any
/// other failure is a query error annotated with the variable name.
pub async fn get_variable(conn: &dyn Connection, name: &str, scope: Scope) -> Result<String> {
    validate_variable_name(name)?;
    let sql = select_variable_sql(name, scope);

    let row = match conn.query_one(&sql).await {
        Ok(row) => row,
        Err(e) if e.is_unknown_variable() => {
            return Err(Error::not_found(name, e.to_string()));
        }
        Err(e) => return Err(e.context(format!("error to get value of var {}", name))),
    };

    row.as_ref()
        .and_then(|r| r.get(0))
        .and_then(|v| v.as_string())
        .ok_or_else(|| {
            Error::query_with_sql(format!("error to get value of var {}: no value", name), sql)
        })
}

/// Read a global system variable
pub async fn get_global_variable(conn: &dyn Connection, name: &str) -> Result<String> {
    get_variable(conn, name, Scope::Global).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_variable_sql() {
        assert_eq!(
            select_variable_sql("read_only", Scope::Global),
            "SELECT @@global.read_only AS val"
        );
        assert_eq!(
            select_variable_sql("sql_mode", Scope::Session),
            "SELECT @@session.sql_mode AS val"
        );
    }

    #[test]
    fn test_scope_default_is_global() {
        assert_eq!(Scope::default(), Scope::Global);
        assert_eq!(Scope::Session.to_string(), "session");
    }
}
