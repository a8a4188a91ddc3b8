//! SMTP delivery
//!
//! Port 465 gets implicit TLS; any other port upgrades with STARTTLS when the
//! relay offers it. Relay certificates are not verified. Login happens only
//! when [`EmailInfo::username`] is set.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::email::{EmailInfo, EmailMessage, MailTransport};
use crate::error::{NotifyError, NotifyResult};

/// Port on which the relay expects TLS from the first byte
pub const SMTPS_PORT: u16 = 465;

const OCTET_STREAM: &str = "application/octet-stream";

/// Delivers messages to the relay in [`EmailInfo`]
#[derive(Debug, Clone, Copy)]
pub struct SmtpTransport {
    timeout: Duration,
}

impl Default for SmtpTransport {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl SmtpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit each SMTP command round trip
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn relay(&self, server: &EmailInfo) -> NotifyResult<AsyncSmtpTransport<Tokio1Executor>> {
        let params = TlsParameters::builder(server.host.clone())
            .dangerous_accept_invalid_certs(true)
            .build()
            .map_err(|e| NotifyError::Config(format!("TLS setup for {}: {}", server.host, e)))?;
        let tls = if server.port == SMTPS_PORT {
            Tls::Wrapper(params)
        } else {
            Tls::Opportunistic(params)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server.host.as_str())
            .port(server.port)
            .tls(tls)
            .timeout(Some(self.timeout));
        if !server.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                server.username.clone(),
                server.password.expose().to_string(),
            ));
        }
        Ok(builder.build())
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, server: &EmailInfo, message: &EmailMessage) -> NotifyResult<()> {
        let mime = to_mime(message).await?;
        let relay = self.relay(server)?;

        debug!(host = %server.host, port = server.port, "connecting to relay");
        let response = relay
            .send(mime)
            .await
            .map_err(|e| NotifyError::Transport(server.password.mask_in(&e.to_string())))?;
        debug!(code = %response.code(), "relay accepted the message");
        Ok(())
    }
}

/// Render a message as MIME, reading attachments from disk
pub async fn to_mime(message: &EmailMessage) -> NotifyResult<Message> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .subject(message.subject.as_str());
    for to in &message.to {
        builder = builder.to(mailbox(to)?);
    }

    let body_type = content_type(&message.content_type)?;
    let mut parts =
        MultiPart::mixed().singlepart(SinglePart::builder().header(body_type).body(message.body.clone()));

    for path in &message.attachments {
        let bytes = tokio::fs::read(path).await.map_err(|e| NotifyError::Attachment {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        parts = parts.singlepart(Attachment::new(file_name(path)).body(bytes, content_type(OCTET_STREAM)?));
    }

    builder
        .multipart(parts)
        .map_err(|e| NotifyError::Config(format!("cannot assemble message: {}", e)))
}

fn mailbox(address: &str) -> NotifyResult<Mailbox> {
    address
        .parse()
        .map_err(|e| NotifyError::Config(format!("bad address '{}': {}", address, e)))
}

fn content_type(raw: &str) -> NotifyResult<ContentType> {
    ContentType::parse(raw).map_err(|e| NotifyError::Config(format!("bad content type '{}': {}", raw, e)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}
