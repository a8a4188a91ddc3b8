//! Set-and-verify toggling of server-wide flags.
//!
//! A toggle issues `SET GLOBAL <var> = <value>`, reads `@@global.<var>` back
//! on the same connection and compares the observed value with the expected
//! one. The server may coerce or silently ignore a value, so the read-back is
//! the only confirmation available over plain SQL.
//!
//! A failed confirmation never undoes the write: by the time the value is
//! read back the server has already applied whatever it accepted.

use std::fmt;
use tracing::{info, warn};

use crate::connection::Connection;
use crate::error::{ConfirmationFailure, Error, Result};
use crate::security::{validate_setting_value, validate_variable_name};
use crate::sysvar::{select_variable_sql, Scope};

/// `SET GLOBAL <name> = <value>`
pub fn set_global_sql(name: &str, value: &str) -> String {
    format!("SET GLOBAL {} = {}", name, value)
}

/// Raw outcome of [`set_global_and_verify`]
///
/// | write | read-back        | `observed`        | `error` |
/// |-------|------------------|-------------------|---------|
/// | fails | not attempted    | empty             | write error |
/// | ok    | fails            | the desired value | read error |
/// | ok    | zero rows        | empty             | none |
/// | ok    | one or more rows | first row value   | none |
#[derive(Debug)]
pub struct GlobalWrite {
    /// Value read back (or the desired value when the read-back failed)
    pub observed: String,
    /// Error from the write or the read-back
    pub error: Option<Error>,
}

impl GlobalWrite {
    fn write_failed(error: Error) -> Self {
        Self {
            observed: String::new(),
            error: Some(error),
        }
    }

    fn unconfirmed(desired: &str, error: Error) -> Self {
        Self {
            observed: desired.to_string(),
            error: Some(error),
        }
    }
}

/// Set a global variable and read it back on the same connection.
///
/// See [`GlobalWrite`] for how each outcome is reported.
pub async fn set_global_and_verify(conn: &dyn Connection, name: &str, desired: &str) -> GlobalWrite {
    if let Err(e) = validate_variable_name(name).and_then(|_| validate_setting_value(desired)) {
        return GlobalWrite::write_failed(e);
    }

    if let Err(e) = conn.execute(&set_global_sql(name, desired)).await {
        return GlobalWrite::write_failed(e);
    }

    let rows = match conn.query(&select_variable_sql(name, Scope::Global)).await {
        Ok(rows) => rows,
        Err(e) => return GlobalWrite::unconfirmed(desired, e),
    };

    match rows.first() {
        None => GlobalWrite {
            observed: String::new(),
            error: None,
        },
        Some(row) => match row.get(0).and_then(|v| v.as_string()) {
            Some(observed) => GlobalWrite {
                observed,
                error: None,
            },
            None => GlobalWrite::unconfirmed(
                desired,
                Error::type_conversion(format!("cannot read {} back as text", name)),
            ),
        },
    }
}

/// Whether two setting tokens mean the same thing
///
/// Comparison is case-insensitive, and the numeric and keyword spellings of a
/// boolean (`1`/`ON`, `0`/`OFF`) are interchangeable.
pub fn tokens_match(observed: &str, expected: &str) -> bool {
    if observed.eq_ignore_ascii_case(expected) {
        return true;
    }
    matches!(
        (bool_token(observed), bool_token(expected)),
        (Some(a), Some(b)) if a == b
    )
}

fn bool_token(token: &str) -> Option<bool> {
    match token.to_ascii_uppercase().as_str() {
        "ON" | "1" => Some(true),
        "OFF" | "0" => Some(false),
        _ => None,
    }
}

/// Direction of a flag change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Switch {
    /// Turn the flag on
    On,
    /// Turn the flag off
    Off,
}

impl Switch {
    /// Verb used in messages
    pub const fn verb(self) -> &'static str {
        match self {
            Self::On => "enable",
            Self::Off => "disable",
        }
    }

    /// Value written with `SET GLOBAL`
    pub const fn desired(self) -> &'static str {
        match self {
            Self::On => "1",
            Self::Off => "0",
        }
    }
}

impl From<bool> for Switch {
    fn from(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// Server-wide flags that can be toggled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalFlag {
    /// `read_only`
    ReadOnly,
    /// `super_read_only`
    SuperReadOnly,
    /// `event_scheduler`
    EventScheduler,
}

impl GlobalFlag {
    /// All toggleable flags
    pub const ALL: [GlobalFlag; 3] = [Self::ReadOnly, Self::SuperReadOnly, Self::EventScheduler];

    /// System variable name
    pub const fn variable(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::SuperReadOnly => "super_read_only",
            Self::EventScheduler => "event_scheduler",
        }
    }

    /// Token the server reports once the flag is in the given position
    pub const fn confirmed_token(self, switch: Switch) -> &'static str {
        match (self, switch) {
            (Self::ReadOnly, Switch::On) => "1",
            (Self::ReadOnly, Switch::Off) => "0",
            (_, Switch::On) => "ON",
            (_, Switch::Off) => "OFF",
        }
    }

    /// The toggle that moves this flag to the given position
    pub fn toggle(self, switch: Switch) -> Toggle {
        Toggle::new(
            self.variable(),
            switch.desired(),
            self.confirmed_token(switch),
        )
        .with_action(switch.verb())
    }
}

impl fmt::Display for GlobalFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variable())
    }
}

/// A parameterized set-and-verify operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    variable: String,
    desired: String,
    expected: String,
    action: String,
}

impl Toggle {
    /// Write `desired` to `variable` and expect `expected` back
    pub fn new(
        variable: impl Into<String>,
        desired: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            desired: desired.into(),
            expected: expected.into(),
            action: "set".to_string(),
        }
    }

    /// Set the verb used in error messages
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Variable being written
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Value written
    pub fn desired(&self) -> &str {
        &self.desired
    }

    /// Value expected on read-back
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Apply the toggle, returning the confirmed value
    pub async fn apply(&self, conn: &dyn Connection) -> Result<String> {
        let write = set_global_and_verify(conn, &self.variable, &self.desired).await;
        let result = self.confirm(write);
        match &result {
            Ok(value) => info!(variable = %self.variable, %value, "{} confirmed", self.action),
            Err(e) => warn!(variable = %self.variable, error = %e, "{} not confirmed", self.action),
        }
        result
    }

    /// Classify a raw write outcome
    pub fn confirm(&self, write: GlobalWrite) -> Result<String> {
        let GlobalWrite { observed, error } = write;

        if observed.is_empty() {
            return Err(self.failure(ConfirmationFailure::WriteFailed, error));
        }
        if let Some(err) = error {
            return Err(self.failure(ConfirmationFailure::ReadBackFailed, Some(err)));
        }
        if !tokens_match(&observed, &self.expected) {
            return Err(self.failure(
                ConfirmationFailure::Mismatch {
                    observed,
                    expected: self.expected.clone(),
                },
                None,
            ));
        }
        Ok(observed)
    }

    fn failure(&self, failure: ConfirmationFailure, cause: Option<Error>) -> Error {
        Error::Confirmation {
            action: self.action.clone(),
            variable: self.variable.clone(),
            failure,
            cause: cause.map(Box::new),
        }
    }
}

/// Move a flag to the given position and confirm it
pub async fn set_flag(conn: &dyn Connection, flag: GlobalFlag, switch: Switch) -> Result<String> {
    flag.toggle(switch).apply(conn).await
}

/// `SET GLOBAL read_only = 1`, confirmed
pub async fn enable_read_only(conn: &dyn Connection) -> Result<()> {
    set_flag(conn, GlobalFlag::ReadOnly, Switch::On).await.map(|_| ())
}

/// `SET GLOBAL read_only = 0`, confirmed
pub async fn disable_read_only(conn: &dyn Connection) -> Result<()> {
    set_flag(conn, GlobalFlag::ReadOnly, Switch::Off).await.map(|_| ())
}

/// `SET GLOBAL super_read_only = 1`, confirmed
pub async fn enable_super_read_only(conn: &dyn Connection) -> Result<()> {
    set_flag(conn, GlobalFlag::SuperReadOnly, Switch::On).await.map(|_| ())
}

/// `SET GLOBAL super_read_only = 0`, confirmed
pub async fn disable_super_read_only(conn: &dyn Connection) -> Result<()> {
    set_flag(conn, GlobalFlag::SuperReadOnly, Switch::Off).await.map(|_| ())
}

/// `SET GLOBAL event_scheduler = 1`, confirmed
pub async fn enable_event_scheduler(conn: &dyn Connection) -> Result<()> {
    set_flag(conn, GlobalFlag::EventScheduler, Switch::On).await.map(|_| ())
}

/// `SET GLOBAL event_scheduler = 0`, confirmed
pub async fn disable_event_scheduler(conn: &dyn Connection) -> Result<()> {
    set_flag(conn, GlobalFlag::EventScheduler, Switch::Off).await.map(|_| ())
}
