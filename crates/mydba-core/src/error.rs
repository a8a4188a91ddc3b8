//! Error types for mydba-core
//!
//! Errors are classified so callers can react to the kind of failure:
//! - NotFound: the named system variable does not exist on this server
//! - Query: execution or scan failure, annotated with what was being done
//! - Confirmation: a global write went through but could not be confirmed
//! - EmptyResult: a bulk read returned nothing

use std::fmt;
use thiserror::Error;

/// Result type for mydba-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Server error code returned for `SELECT @@<unknown>` and `SET GLOBAL <unknown>`
pub const ER_UNKNOWN_SYSTEM_VARIABLE: u16 = 1193;

/// Message fragment used when the driver gives us no structured error code
const UNKNOWN_SYSTEM_VARIABLE_MSG: &str = "Unknown system variable";

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The named variable does not exist
    NotFound,
    /// Query execution or result scanning failed
    Query,
    /// A write succeeded (or may have) but could not be confirmed
    Confirmation,
    /// A bulk read produced no rows
    EmptyResult,
    /// A server setting has a value other than the one required
    InvalidSetting,
    /// Connection-level failure (I/O, driver, handle unavailable)
    Connection,
    /// Operation timed out
    Timeout,
    /// Invalid input or configuration
    Configuration,
    /// A value could not be converted to the requested type
    TypeConversion,
}

impl ErrorCategory {
    /// Whether errors in this category mean the server could not be reached
    #[inline]
    pub const fn is_connection_level(self) -> bool {
        matches!(self, Self::Connection | Self::Timeout)
    }
}

/// How a set-and-verify operation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationFailure {
    /// Nothing was read back; the write itself appears to have failed
    WriteFailed,
    /// The write went through but reading the value back failed
    ReadBackFailed,
    /// The value read back is not the expected one
    Mismatch {
        /// Value reported by the server
        observed: String,
        /// Value the caller expected
        expected: String,
    },
}

impl fmt::Display for ConfirmationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "write appears to have failed"),
            Self::ReadBackFailed => write!(f, "write succeeded but confirmation read failed"),
            Self::Mismatch { observed, expected } => write!(
                f,
                "write succeeded but observed value '{}' does not match expected '{}'",
                observed, expected
            ),
        }
    }
}

/// Main error type for mydba-core
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    /// Named system variable does not exist on this server
    #[error("no such variable {variable}: {message}")]
    NotFound { variable: String, message: String },

    /// Query execution failed
    #[error("query error: {message}")]
    Query {
        message: String,
        sql: Option<String>,
        /// Server error code, when the server answered with one
        code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Set-and-verify could not confirm the write
    #[error("failed to {action} {variable}: {failure}{}", describe_cause(.cause))]
    Confirmation {
        action: String,
        variable: String,
        failure: ConfirmationFailure,
        cause: Option<Box<Error>>,
    },

    /// Bulk read returned no rows
    #[error("empty result from `{sql}`")]
    EmptyResult { sql: String },

    /// Server setting does not have the required value
    #[error("invalid server setting {setting}={actual}, must be {expected}")]
    InvalidSetting {
        setting: String,
        expected: String,
        actual: String,
    },

    /// Connection failed or is unavailable
    #[error("connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out
    #[error("timeout: {message}")]
    Timeout { message: String },

    /// Configuration or input error
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Type conversion failed
    #[error("type conversion error: {message}")]
    TypeConversion { message: String },
}

fn describe_cause(cause: &Option<Box<Error>>) -> String {
    match cause {
        Some(err) => format!(": {}", err),
        None => String::new(),
    }
}

impl Error {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Query { .. } => ErrorCategory::Query,
            Self::Confirmation { .. } => ErrorCategory::Confirmation,
            Self::EmptyResult { .. } => ErrorCategory::EmptyResult,
            Self::InvalidSetting { .. } => ErrorCategory::InvalidSetting,
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::TypeConversion { .. } => ErrorCategory::TypeConversion,
        }
    }

    /// Whether this error reports a missing variable
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Server error code carried by this error, if the server answered with one
    pub fn server_code(&self) -> Option<u16> {
        match self {
            Self::Query { code, .. } => *code,
            Self::Confirmation { cause: Some(cause), .. } => cause.server_code(),
            _ => None,
        }
    }

    /// Whether the server rejected the statement because the variable is unknown
    ///
    /// Matches on the structured error code first and only falls back to the
    /// message text when no code is available.
    pub fn is_unknown_variable(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Query {
                code: Some(code), ..
            } => *code == ER_UNKNOWN_SYSTEM_VARIABLE,
            Self::Query {
                code: None,
                message,
                ..
            } => message.contains(UNKNOWN_SYSTEM_VARIABLE_MSG),
            _ => false,
        }
    }

    /// Annotate this error with context, keeping its server code
    ///
    /// The result is always a `Query` error.
    pub fn context(self, context: impl Into<String>) -> Self {
        let code = self.server_code();
        let sql = match &self {
            Self::Query { sql, .. } => sql.clone(),
            _ => None,
        };
        Self::Query {
            message: format!("{}: {}", context.into(), self),
            sql,
            code,
            source: Some(Box::new(self)),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql: None,
            code: None,
            source: None,
        }
    }

    /// Create a query error with SQL
    pub fn query_with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql: Some(sql.into()),
            code: None,
            source: None,
        }
    }

    /// Create an error for a statement the server rejected with an error code
    pub fn server(code: u16, message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql: Some(sql.into()),
            code: Some(code),
            source: None,
        }
    }

    /// Create a not-found error for a system variable
    pub fn not_found(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Create an empty-result error
    pub fn empty_result(sql: impl Into<String>) -> Self {
        Self::EmptyResult { sql: sql.into() }
    }

    /// Create an invalid-setting error
    pub fn invalid_setting(
        setting: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidSetting {
            setting: setting.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a type conversion error
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Query => write!(f, "query"),
            Self::Confirmation => write!(f, "confirmation"),
            Self::EmptyResult => write!(f, "empty_result"),
            Self::InvalidSetting => write!(f, "invalid_setting"),
            Self::Connection => write!(f, "connection"),
            Self::Timeout => write!(f, "timeout"),
            Self::Configuration => write!(f, "configuration"),
            Self::TypeConversion => write!(f, "type_conversion"),
        }
    }
}
