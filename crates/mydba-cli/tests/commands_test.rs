//! Command execution against the in-memory server

use mydba_cli::commands::{run, run_on};
use mydba_cli::{Commands, MydbaConfig, SwitchArg, VarCommands};
use mydba_core::testing::{MockFailure, MockServer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

async fn exec(server: &MockServer, command: Commands) -> anyhow::Result<String> {
    let mut out = Vec::new();
    run_on(server, &command, &MydbaConfig::default(), &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_ping() {
    let server = MockServer::with_defaults();
    assert_eq!(exec(&server, Commands::Ping { probe: None }).await.unwrap(), "alive\n");

    let dead = MockServer::with_defaults()
        .fail_on("SELECT 1", MockFailure::connection("Connection refused"));
    assert!(exec(&dead, Commands::Ping { probe: None }).await.is_err());
}

#[tokio::test]
async fn test_toggle_prints_confirmed_value() {
    let server = MockServer::with_defaults();

    let out = exec(&server, Commands::ReadOnly { state: SwitchArg::On })
        .await
        .unwrap();
    assert_eq!(out, "read_only = 1\n");

    let out = exec(
        &server,
        Commands::EventScheduler {
            state: SwitchArg::Off,
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "event_scheduler = OFF\n");
}

#[tokio::test]
async fn test_toggle_failure_is_error() {
    let server = MockServer::with_defaults().pin_variable("super_read_only");

    let err = exec(
        &server,
        Commands::SuperReadOnly {
            state: SwitchArg::On,
        },
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("super_read_only"));
}

#[tokio::test]
async fn test_var_get() {
    let server = MockServer::with_defaults();
    let out = exec(
        &server,
        Commands::Var {
            action: VarCommands::Get {
                name: "binlog_format".into(),
                session: false,
            },
        },
    )
    .await
    .unwrap();
    assert_eq!(out, "ROW\n");
}

#[tokio::test]
async fn test_status_json() {
    let server = MockServer::new()
        .with_status("Uptime", "10")
        .with_status("Questions", "3");

    let out = exec(&server, Commands::Status { json: true }).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["Uptime"], 10);
    assert_eq!(parsed["Questions"], 3);

    let out = exec(&server, Commands::Status { json: false }).await.unwrap();
    assert_eq!(out, "Questions\t3\nUptime\t10\n");
}

#[tokio::test]
async fn test_replication_report() {
    let server = MockServer::with_defaults().with_replica(&[("Slave_IO_Running", "Yes")]);

    let out = exec(&server, Commands::Replication).await.unwrap();
    assert!(out.contains("File: binlog.000003"));
    assert!(out.contains("Position: 157"));
    assert!(out.contains("Slave_IO_Running: Yes"));

    let standalone = MockServer::with_defaults().without_master();
    let out = exec(&standalone, Commands::Replication).await.unwrap();
    assert!(out.contains("binary logging disabled"));
    assert!(out.contains("not a replica"));
}

#[tokio::test]
async fn test_check_binlog() {
    let server = MockServer::with_defaults();
    assert_eq!(
        exec(&server, Commands::CheckBinlog).await.unwrap(),
        "binlog format ok\n"
    );

    let server = MockServer::with_defaults().with_global("binlog_format", "MIXED");
    assert!(exec(&server, Commands::CheckBinlog).await.is_err());
}

#[tokio::test]
async fn test_session_commands() {
    let server = MockServer::with_defaults().with_connection_id(7);
    assert_eq!(exec(&server, Commands::ConnectionId).await.unwrap(), "7\n");
    assert_eq!(
        exec(&server, Commands::UnlockTables).await.unwrap(),
        "tables unlocked\n"
    );
}

fn notify_command(dry_run: bool) -> Commands {
    Commands::Notify {
        subject: "db01 read_only".into(),
        body: "read_only=1".into(),
        gateway: None,
        html: false,
        attach: Vec::new(),
        dry_run,
    }
}

fn notify_config(port: u16) -> MydbaConfig {
    MydbaConfig::from_yaml(&format!(
        "notify:\n  timeout_secs: 5\n  email:\n    host: 127.0.0.1\n    port: {port}\n    from: a@example.com\n    to: [b@example.com]\n"
    ))
    .unwrap()
}

/// Accept one SMTP session and answer every command positively; yields the
/// envelope lines the client sent
async fn smtp_relay() -> (u16, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        let mut envelope = Vec::new();
        let mut in_data = false;

        write.write_all(b"220 relay.test ESMTP\r\n").await.unwrap();
        while let Ok(Some(line)) = lines.next_line().await {
            let reply: &[u8] = if in_data {
                if line != "." {
                    continue;
                }
                in_data = false;
                b"250 queued\r\n"
            } else if line == "DATA" {
                in_data = true;
                b"354 go ahead\r\n"
            } else if line == "QUIT" {
                write.write_all(b"221 bye\r\n").await.ok();
                break;
            } else {
                if line.starts_with("MAIL") || line.starts_with("RCPT") {
                    envelope.push(line);
                }
                b"250 ok\r\n"
            };
            if write.write_all(reply).await.is_err() {
                break;
            }
        }
        envelope
    });

    (port, handle)
}

#[tokio::test]
async fn test_notify_without_config_fails() {
    let mut out = Vec::new();
    let err = run(&notify_command(false), &MydbaConfig::default(), &mut out)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("notify"));
}

#[tokio::test]
async fn test_notify_without_gateway_sends_over_smtp() {
    let (port, relay) = smtp_relay().await;

    let mut out = Vec::new();
    run(&notify_command(false), &notify_config(port), &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "sent to b@example.com\n");

    let envelope = relay.await.unwrap();
    assert!(envelope[0].starts_with("MAIL FROM:<a@example.com>"));
    assert!(envelope[1].starts_with("RCPT TO:<b@example.com>"));
}

#[tokio::test]
async fn test_notify_unreachable_relay_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut out = Vec::new();
    let result = run(&notify_command(false), &notify_config(port), &mut out).await;
    assert!(result.is_err());
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_notify_dry_run_sends_nothing() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut out = Vec::new();
    run(&notify_command(true), &notify_config(port), &mut out)
        .await
        .unwrap();
    assert!(out.is_empty());
}
