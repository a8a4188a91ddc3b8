//! Error types for mydba-notify

/// Result type alias for notification operations
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;

/// Errors that can occur while delivering a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Invalid sender, recipient or gateway configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// An attachment path does not point at a readable file
    #[error("attachment {path}: {message}")]
    Attachment { path: String, message: String },

    /// The mail transport refused or failed to deliver the message
    #[error("transport error: {0}")]
    Transport(String),

    /// The HTTP gateway answered with a non-success status
    #[error("gateway returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Request timeout
    #[error("timeout: {0}")]
    Timeout(String),

    /// Network / transport error
    #[error("connection error: {0}")]
    Connection(String),

    /// Any other request failure
    #[error("request error: {0}")]
    Request(String),
}

impl NotifyError {
    /// Whether delivery may succeed if retried
    pub fn is_retryable(&self) -> bool {
        match self {
            NotifyError::Timeout(_) | NotifyError::Connection(_) => true,
            NotifyError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotifyError::Timeout("request timed out".to_string())
        } else if err.is_connect() {
            NotifyError::Connection(err.to_string())
        } else if err.is_builder() {
            NotifyError::Config(err.to_string())
        } else {
            NotifyError::Request(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for NotifyError {
    fn from(err: validator::ValidationErrors) -> Self {
        NotifyError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(NotifyError::Timeout("x".into()).is_retryable());
        assert!(NotifyError::Http {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!NotifyError::Http {
            status: 404,
            body: String::new()
        }
        .is_retryable());
        assert!(!NotifyError::Config("x".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = NotifyError::Attachment {
            path: "/tmp/report.txt".into(),
            message: "not found".into(),
        };
        assert_eq!(err.to_string(), "attachment /tmp/report.txt: not found");
    }
}
