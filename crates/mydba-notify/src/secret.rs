//! Credentials read from configuration
//!
//! A [`Credential`] is a relay password or a database URL with a password in
//! it. The value is only reachable through [`Credential::expose`]; `Debug`
//! and serialization print `***`, the same mask the core crate uses for
//! connection URLs.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MASK: &str = "***";

/// A secret loaded from the configuration file
///
/// ```rust
/// use mydba_notify::Credential;
///
/// let password = Credential::new("hunter2");
/// assert_eq!(format!("{:?}", password), "Credential(***)");
///
/// let reply = "535 auth failed for alerts/hunter2";
/// assert_eq!(password.mask_in(reply), "535 auth failed for alerts/***");
/// ```
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct Credential(Arc<SecretString>);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::new(value.into().into_boxed_str())))
    }

    /// The plain value, for authenticating or connecting
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    /// Replace every occurrence of the secret in `text` with `***`
    ///
    /// Relays and drivers sometimes echo the login or URL back in their error
    /// text; run such text through this before logging or returning it.
    pub fn mask_in(&self, text: &str) -> String {
        if self.is_empty() {
            return text.to_string();
        }
        text.replace(self.expose(), MASK)
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential({})", MASK)
    }
}

impl Serialize for Credential {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            serializer.serialize_str("")
        } else {
            serializer.serialize_str(MASK)
        }
    }
}
