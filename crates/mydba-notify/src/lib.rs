//! # mydba-notify
//!
//! Alert delivery for mydba.
//!
//! - **E-mail**: a message model ([`EmailInfo`], [`EmailContent`]) delivered
//!   through a [`MailTransport`], normally [`SmtpTransport`]
//! - **HTTP gateway**: `GET <url>?emails=...&subject=...&message=...` for sites
//!   that relay mail over HTTP
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use mydba_notify::{Credential, EmailBody, EmailContent, EmailInfo, SmtpTransport};
//!
//! # async fn example() -> Result<(), mydba_notify::NotifyError> {
//! let info = EmailInfo {
//!     host: "smtp.example.com".into(),
//!     port: 465,
//!     username: "alerts".into(),
//!     password: Credential::new("secret"),
//!     from: "alerts@example.com".into(),
//!     to: vec!["dba@example.com".into()],
//! };
//!
//! let content = EmailContent::new("db01 is read-only", EmailBody::plain("super_read_only=ON"));
//! info.send_email(&SmtpTransport::new(), &content).await?;
//!
//! // or through an HTTP mail gateway
//! let reply = info
//!     .send_email_url_get("https://mail-gw.example.com/send", &content, Duration::from_secs(5))
//!     .await?;
//! println!("{}", String::from_utf8_lossy(&reply));
//! # Ok(())
//! # }
//! ```

pub mod email;
pub mod error;
pub mod http;
pub mod secret;
pub mod smtp;

pub use email::{
    EmailBody, EmailContent, EmailInfo, EmailMessage, LogTransport, MailTransport,
    RecordingTransport,
};
pub use error::{NotifyError, NotifyResult};
pub use http::{build_url, request_get};
pub use secret::Credential;
pub use smtp::SmtpTransport;
