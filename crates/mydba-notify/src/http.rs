//! HTTP mail gateway client
//!
//! Some sites relay alerts through an HTTP endpoint instead of SMTP:
//! `GET <url>?emails=a@x,b@y&subject=...&message=...`.

use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::email::{EmailContent, EmailInfo};
use crate::error::{NotifyError, NotifyResult};

/// Longest response body quoted in an error
const MAX_ERROR_BODY: usize = 512;

/// Append `params` to `base` as a percent-encoded query string
///
/// Existing query parameters on `base` are kept.
pub fn build_url(base: &str, params: &[(&str, &str)]) -> NotifyResult<Url> {
    let mut url =
        Url::parse(base).map_err(|e| NotifyError::Config(format!("invalid gateway URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(NotifyError::Config(format!(
            "unsupported gateway URL scheme '{}'",
            url.scheme()
        )));
    }

    url.query_pairs_mut().extend_pairs(params.iter().copied());
    Ok(url)
}

/// Issue a GET and return the raw body; non-2xx statuses are errors
pub async fn request_get(url: &Url, timeout: Duration) -> NotifyResult<Vec<u8>> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| NotifyError::Config(format!("failed to build HTTP client: {e}")))?;

    debug!(host = url.host_str().unwrap_or_default(), ?timeout, "gateway request");
    let resp = client.get(url.clone()).send().await?;

    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        let text = String::from_utf8_lossy(&body);
        let end = text
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|i| *i <= MAX_ERROR_BODY)
            .last()
            .unwrap_or(0);
        let body = if text.len() > MAX_ERROR_BODY {
            format!("{}...[truncated]", &text[..end])
        } else {
            text.into_owned()
        };
        return Err(NotifyError::Http {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body.to_vec())
}

impl EmailInfo {
    /// Gateway URL for `content` addressed to this account's recipients
    pub fn gateway_url(&self, url: &str, content: &EmailContent) -> NotifyResult<Url> {
        let emails = self.to.join(",");
        build_url(
            url,
            &[
                ("emails", emails.as_str()),
                ("subject", content.subject.as_str()),
                ("message", content.body.body.as_str()),
            ],
        )
    }

    /// Deliver `content` through an HTTP mail gateway, returning its response body
    pub async fn send_email_url_get(
        &self,
        url: &str,
        content: &EmailContent,
        timeout: Duration,
    ) -> NotifyResult<Vec<u8>> {
        if self.to.is_empty() {
            return Err(NotifyError::Config("no recipients".to_string()));
        }
        let url = self.gateway_url(url, content)?;
        request_get(&url, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes() {
        let url = build_url(
            "http://gw.example.com/send",
            &[("subject", "lag > 60s & rising"), ("emails", "a@x.com,b@y.com")],
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "http://gw.example.com/send?subject=lag+%3E+60s+%26+rising&emails=a%40x.com%2Cb%40y.com"
        );
    }

    #[test]
    fn test_build_url_keeps_existing_query() {
        let url = build_url("https://gw.example.com/send?token=abc", &[("subject", "hi")]).unwrap();
        assert_eq!(url.query(), Some("token=abc&subject=hi"));
    }

    #[test]
    fn test_build_url_rejects_bad_input() {
        assert!(matches!(
            build_url("not a url", &[]),
            Err(NotifyError::Config(_))
        ));
        assert!(matches!(
            build_url("ftp://gw.example.com/", &[]),
            Err(NotifyError::Config(_))
        ));
    }
}
