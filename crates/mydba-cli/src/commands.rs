//! Command execution

use std::io::Write;

use anyhow::Context;
use mydba_core::prelude::*;
use mydba_notify::{EmailBody, EmailContent, LogTransport, SmtpTransport};
use tracing::{info, warn};

use crate::cli::{Commands, VarCommands};
use crate::config::MydbaConfig;

/// Run a command, connecting to the configured server when it needs one
pub async fn run(command: &Commands, config: &MydbaConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    if !command.needs_database() {
        return notify(command, config, out).await;
    }

    let conn_config = config.connection_config()?;
    let conn = MySqlConnection::connect(&conn_config)
        .await
        .with_context(|| format!("cannot connect to {}", conn_config.redacted_url()))?;

    let result = run_on(&conn, command, config, out).await;
    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close connection");
    }
    result
}

/// Run a database command over an open connection
pub async fn run_on(
    conn: &dyn Connection,
    command: &Commands,
    config: &MydbaConfig,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Commands::Ping { probe } => {
            let probe = probe.as_deref().unwrap_or(&config.probe.query);
            if !is_alive(conn, probe).await {
                anyhow::bail!("server is not responding");
            }
            writeln!(out, "alive")?;
        }
        Commands::Var {
            action: VarCommands::Get { name, session },
        } => {
            let scope = if *session { Scope::Session } else { Scope::Global };
            let value = get_variable(conn, name, scope).await?;
            writeln!(out, "{}", value)?;
        }
        Commands::Status { json } => {
            let snapshot = read_global_status(conn).await?;
            if *json {
                let map = snapshot.into_inner();
                writeln!(out, "{}", serde_json::to_string_pretty(&map)?)?;
            } else {
                for (name, value) in snapshot.iter() {
                    writeln!(out, "{}\t{}", name, value)?;
                }
            }
        }
        Commands::Variables => {
            for (name, value) in show_global_variables(conn).await? {
                writeln!(out, "{}\t{}", name, value)?;
            }
        }
        Commands::Replication => replication(conn, out).await?,
        Commands::InnodbStatus => {
            writeln!(out, "{}", show_engine_innodb_status(conn).await?)?;
        }
        Commands::CheckBinlog => {
            check_binlog_format_row_full(conn).await?;
            writeln!(out, "binlog format ok")?;
        }
        Commands::UnlockTables => {
            unlock_all_tables(conn).await?;
            writeln!(out, "tables unlocked")?;
        }
        Commands::ConnectionId => {
            writeln!(out, "{}", connection_id(conn).await?)?;
        }
        Commands::ReadOnly { .. }
        | Commands::SuperReadOnly { .. }
        | Commands::EventScheduler { .. } => {
            if let Some((flag, switch)) = command.flag_change() {
                let value = set_flag(conn, flag, switch).await?;
                writeln!(out, "{} = {}", flag, value)?;
            }
        }
        Commands::Notify { .. } => anyhow::bail!("notify does not use a database connection"),
    }
    Ok(())
}

async fn replication(conn: &dyn Connection, out: &mut dyn Write) -> anyhow::Result<()> {
    match show_master_status(conn).await? {
        Some(pos) => {
            writeln!(out, "File: {}", pos.file)?;
            writeln!(out, "Position: {}", pos.position)?;
            if let Some(gtids) = pos.executed_gtid_set {
                writeln!(out, "Executed_Gtid_Set: {}", gtids)?;
            }
        }
        None => writeln!(out, "binary logging disabled")?,
    }

    let channels = show_slave_status(conn).await?;
    if channels.is_empty() {
        writeln!(out, "not a replica")?;
    }
    for (i, channel) in channels.iter().enumerate() {
        writeln!(out, "--- channel {} ---", i + 1)?;
        for (column, value) in channel {
            writeln!(out, "{}: {}", column, value)?;
        }
    }
    Ok(())
}

async fn notify(command: &Commands, config: &MydbaConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let Commands::Notify {
        subject,
        body,
        gateway,
        html,
        attach,
        dry_run,
    } = command
    else {
        anyhow::bail!("not a notify command");
    };

    let notify = config
        .notify
        .as_ref()
        .context("no notify section in the config file")?;

    let body = if *html {
        EmailBody::html(body.as_str())
    } else {
        EmailBody::plain(body.as_str())
    };
    let mut content = EmailContent::new(subject.as_str(), body);
    for path in attach {
        content = content.with_attachment(path);
    }

    if *dry_run {
        return Ok(notify.email.send_email(&LogTransport, &content).await?);
    }

    match gateway.as_deref().or(notify.gateway_url.as_deref()) {
        Some(gateway) => {
            let reply = notify
                .email
                .send_email_url_get(gateway, &content, notify.timeout())
                .await?;
            info!(bytes = reply.len(), "gateway accepted the message");
            writeln!(out, "{}", String::from_utf8_lossy(&reply))?;
        }
        None => {
            let smtp = SmtpTransport::new().with_timeout(notify.timeout());
            notify.email.send_email(&smtp, &content).await?;
            writeln!(out, "sent to {}", notify.email.to.join(", "))?;
        }
    }
    Ok(())
}
