//! Input validation for statements built by string formatting.
//!
//! `SET GLOBAL <name> = <value>` and `SELECT @@global.<name>` cannot take
//! bind parameters for the variable name, so names and values are checked
//! against a strict grammar before they are formatted into SQL.

use crate::error::Error;

/// Maximum length of a system variable name accepted here
const MAX_IDENTIFIER_LEN: usize = 64;

/// Validate a system variable name.
///
/// - Must not be empty
/// - At most 64 characters
/// - Must start with an ASCII letter or underscore
/// - May only contain ASCII alphanumeric characters and underscores
///
/// # Examples
///
/// ```
/// use mydba_core::security::validate_variable_name;
///
/// assert!(validate_variable_name("read_only").is_ok());
/// assert!(validate_variable_name("binlog_row_image").is_ok());
///
/// assert!(validate_variable_name("read_only = 0; DROP TABLE t").is_err());
/// assert!(validate_variable_name("").is_err());
/// ```
pub fn validate_variable_name(name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(Error::config("variable name cannot be empty"));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::config(format!(
            "variable name too long: {} chars (max {})",
            name.len(),
            MAX_IDENTIFIER_LEN
        )));
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => {
            return Err(Error::config(format!(
                "invalid variable name '{}': must start with a letter or underscore",
                name
            )));
        }
    }

    for c in chars {
        if !c.is_ascii_alphanumeric() && c != '_' {
            return Err(Error::config(format!(
                "invalid variable name '{}': contains invalid character '{}'",
                name, c
            )));
        }
    }

    Ok(())
}

/// Validate a value for `SET GLOBAL`.
///
/// Accepts a bare keyword (`ON`, `ROW`, `FULL`), or a numeric literal with an
/// optional sign and fractional part. Quoted strings are rejected.
///
/// ```
/// use mydba_core::security::validate_setting_value;
///
/// assert!(validate_setting_value("1").is_ok());
/// assert!(validate_setting_value("ON").is_ok());
/// assert!(validate_setting_value("-0.5").is_ok());
/// assert!(validate_setting_value("1; SHUTDOWN").is_err());
/// ```
pub fn validate_setting_value(value: &str) -> crate::Result<()> {
    if is_numeric_literal(value) {
        return Ok(());
    }
    validate_variable_name(value)
        .map_err(|_| Error::config(format!("invalid setting value '{}'", value)))
}

fn is_numeric_literal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}
