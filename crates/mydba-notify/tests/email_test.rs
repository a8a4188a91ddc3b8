//! E-mail delivery through a transport

use std::io::Write;

use mydba_notify::*;

fn info() -> EmailInfo {
    EmailInfo {
        host: "smtp.example.com".into(),
        port: 587,
        username: "alerts".into(),
        password: Credential::new("app-password"),
        from: "alerts@example.com".into(),
        to: vec!["dba@example.com".into()],
    }
}

#[tokio::test]
async fn test_send_email_with_attachment() {
    let mut report = tempfile::NamedTempFile::new().unwrap();
    writeln!(report, "Seconds_Behind_Master: 340").unwrap();

    let transport = RecordingTransport::new();
    let content = EmailContent::new("replica lag", EmailBody::plain("see attached"))
        .with_attachment(report.path());

    info().send_email(&transport, &content).await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "replica lag");
    assert_eq!(sent[0].to, vec!["dba@example.com".to_string()]);
    assert_eq!(sent[0].attachments, vec![report.path().to_path_buf()]);
}

#[tokio::test]
async fn test_missing_attachment_is_not_sent() {
    let dir = tempfile::tempdir().unwrap();
    let transport = RecordingTransport::new();
    let content = EmailContent::new("x", EmailBody::plain("y"))
        .with_attachment(dir.path().join("gone.log"));

    let err = info().send_email(&transport, &content).await.unwrap_err();
    assert!(matches!(err, NotifyError::Attachment { .. }));
    assert!(transport.sent().is_empty());

    // a directory is not an attachment either
    let content = EmailContent::new("x", EmailBody::plain("y")).with_attachment(dir.path());
    assert!(info().send_email(&transport, &content).await.is_err());
}

#[tokio::test]
async fn test_invalid_account_is_not_sent() {
    let transport = RecordingTransport::new();
    let mut account = info();
    account.to.clear();

    let err = account
        .send_email(&transport, &EmailContent::new("x", EmailBody::plain("y")))
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::Config(_)));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let transport = RecordingTransport::new().fail_with("535 authentication failed");

    let err = info()
        .send_email(&transport, &EmailContent::new("x", EmailBody::plain("y")))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("535"));
}

#[tokio::test]
async fn test_log_transport_accepts() {
    info()
        .send_email(&LogTransport, &EmailContent::new("x", EmailBody::plain("y")))
        .await
        .unwrap();
}

#[test]
fn test_email_info_deserialize() {
    let info: EmailInfo = serde_json::from_str(
        r#"{"host":"smtp.example.com","password":"pw","from":"a@example.com","to":["b@example.com"]}"#,
    )
    .unwrap();

    assert_eq!(info.port, 465);
    assert_eq!(info.password.expose(), "pw");
    assert!(info.username.is_empty());

    let dumped = serde_json::to_string(&info).unwrap();
    assert!(dumped.contains(r#""password":"***""#));
    assert!(!dumped.contains("\"pw\""));
}
