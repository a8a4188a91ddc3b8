//! E-mail message model and transport seam
//!
//! [`EmailInfo`] describes the sending account and recipients, [`EmailContent`]
//! the message. Delivery goes through a [`MailTransport`]; the SMTP one lives
//! in [`crate::smtp`].

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::error::{NotifyError, NotifyResult};
use crate::secret::Credential;

fn default_port() -> u16 {
    465
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

/// Sending account and recipients
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct EmailInfo {
    /// SMTP relay host
    #[validate(length(min = 1))]
    pub host: String,

    /// SMTP relay port
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Login name on the relay
    #[serde(default)]
    pub username: String,

    /// Login password
    #[serde(default)]
    pub password: Credential,

    /// `From` address
    #[validate(email)]
    pub from: String,

    /// `To` addresses
    #[validate(length(min = 1))]
    pub to: Vec<String>,
}

/// Message body with its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmailBody {
    /// Body text
    pub body: String,
    /// MIME type, e.g. `text/plain` or `text/html`
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl EmailBody {
    /// Plain-text body
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: default_content_type(),
        }
    }

    /// HTML body
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: "text/html".to_string(),
        }
    }
}

/// What to send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmailContent {
    /// Subject line
    pub subject: String,
    /// Body
    pub body: EmailBody,
    /// Files to attach
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
}

impl EmailContent {
    /// Create content without attachments
    pub fn new(subject: impl Into<String>, body: EmailBody) -> Self {
        Self {
            subject: subject.into(),
            body,
            attachments: Vec::new(),
        }
    }

    /// Attach a file
    pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }
}

/// A fully assembled message, ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// `From` header
    pub from: String,
    /// `To` header
    pub to: Vec<String>,
    /// `Subject` header
    pub subject: String,
    /// Body MIME type
    pub content_type: String,
    /// Body text
    pub body: String,
    /// Attachment files, all known to exist when the message was built
    pub attachments: Vec<PathBuf>,
}

impl EmailMessage {
    /// Assemble a message, checking that every attachment is a file
    pub fn build(info: &EmailInfo, content: &EmailContent) -> NotifyResult<Self> {
        for path in &content.attachments {
            check_attachment(path)?;
        }

        Ok(Self {
            from: info.from.clone(),
            to: info.to.clone(),
            subject: content.subject.clone(),
            content_type: content.body.content_type.clone(),
            body: content.body.body.clone(),
            attachments: content.attachments.clone(),
        })
    }
}

fn check_attachment(path: &Path) -> NotifyResult<()> {
    match path.metadata() {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(NotifyError::Attachment {
            path: path.display().to_string(),
            message: "not a regular file".to_string(),
        }),
        Err(e) => Err(NotifyError::Attachment {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

/// Delivers assembled messages
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver `message` through the relay described by `server`
    async fn send(&self, server: &EmailInfo, message: &EmailMessage) -> NotifyResult<()>;
}

impl EmailInfo {
    /// Validate, assemble and deliver `content` through `transport`
    pub async fn send_email(
        &self,
        transport: &dyn MailTransport,
        content: &EmailContent,
    ) -> NotifyResult<()> {
        self.validate()?;
        let message = EmailMessage::build(self, content)?;

        debug!(
            host = %self.host,
            port = self.port,
            recipients = message.to.len(),
            attachments = message.attachments.len(),
            "sending email"
        );
        transport.send(self, &message).await?;
        info!(subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Transport that writes messages to the log instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, server: &EmailInfo, message: &EmailMessage) -> NotifyResult<()> {
        info!(
            relay = %format!("{}:{}", server.host, server.port),
            from = %message.from,
            to = %message.to.join(","),
            subject = %message.subject,
            "{}",
            message.body
        );
        Ok(())
    }
}

/// Transport that keeps every message in memory
///
/// Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    fail_message: Arc<Mutex<Option<String>>>,
}

impl RecordingTransport {
    /// Create an empty outbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message with a transport error
    pub fn fail_with(self, message: impl Into<String>) -> Self {
        *self.fail_message.lock() = Some(message.into());
        self
    }

    /// Messages delivered so far
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, _server: &EmailInfo, message: &EmailMessage) -> NotifyResult<()> {
        if let Some(msg) = self.fail_message.lock().clone() {
            return Err(NotifyError::Transport(msg));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> EmailInfo {
        EmailInfo {
            host: "smtp.example.com".into(),
            port: 465,
            username: "alerts".into(),
            password: Credential::new("pw"),
            from: "alerts@example.com".into(),
            to: vec!["dba@example.com".into(), "oncall@example.com".into()],
        }
    }

    #[test]
    fn test_build_message() {
        let content = EmailContent::new("replica lag", EmailBody::html("<b>120s</b>"));
        let message = EmailMessage::build(&info(), &content).unwrap();

        assert_eq!(message.from, "alerts@example.com");
        assert_eq!(message.to.len(), 2);
        assert_eq!(message.content_type, "text/html");
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn test_missing_attachment() {
        let content = EmailContent::new("x", EmailBody::plain("y"))
            .with_attachment("/definitely/not/here.log");
        let err = EmailMessage::build(&info(), &content).unwrap_err();
        assert!(matches!(err, NotifyError::Attachment { .. }));
    }

    #[test]
    fn test_validation() {
        assert!(info().validate().is_ok());

        let mut bad = info();
        bad.to.clear();
        assert!(bad.validate().is_err());

        let mut bad = info();
        bad.from = "not an address".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", info());
        assert!(debug.contains("Credential(***)"));
        assert!(!debug.contains("\"pw\""));
    }
}
