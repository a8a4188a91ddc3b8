//! Command line arguments

use clap::{Parser, Subcommand, ValueEnum};
use mydba_core::toggle::{GlobalFlag, Switch};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mydba")]
#[command(about = "mydba - administrative helpers for MySQL-compatible servers")]
#[command(version)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL (overrides database.url from the config file)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Log filter, e.g. `debug` or `mydba_core=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check that the server answers
    Ping {
        /// Probe statement (default: probe.query from the config, or SELECT 1)
        #[arg(long)]
        probe: Option<String>,
    },

    /// System variables
    Var {
        #[command(subcommand)]
        action: VarCommands,
    },

    /// Turn read_only on or off
    ReadOnly {
        /// Desired state
        state: SwitchArg,
    },

    /// Turn super_read_only on or off
    SuperReadOnly {
        /// Desired state
        state: SwitchArg,
    },

    /// Turn the event scheduler on or off
    EventScheduler {
        /// Desired state
        state: SwitchArg,
    },

    /// Numeric SHOW GLOBAL STATUS counters
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// SHOW GLOBAL VARIABLES
    Variables,

    /// Binlog coordinates and replica channels
    Replication,

    /// SHOW ENGINE INNODB STATUS
    InnodbStatus,

    /// Verify binlog_format=ROW and binlog_row_image=FULL
    CheckBinlog,

    /// Release table locks held by this session
    UnlockTables,

    /// Server thread id of this session
    ConnectionId,

    /// Mail an alert to the configured recipients over SMTP or the HTTP gateway
    Notify {
        /// Subject line
        #[arg(short, long)]
        subject: String,

        /// Message body
        #[arg(short, long)]
        body: String,

        /// HTTP mail gateway (overrides notify.gateway_url)
        #[arg(long)]
        gateway: Option<String>,

        /// Send the body as text/html
        #[arg(long)]
        html: bool,

        /// File to attach (repeatable)
        #[arg(short, long)]
        attach: Vec<PathBuf>,

        /// Write the message to the log instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum VarCommands {
    /// Read one variable
    Get {
        /// Variable name
        name: String,

        /// Read the session value instead of the global one
        #[arg(long)]
        session: bool,
    },
}

/// `on` / `off`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchArg {
    On,
    Off,
}

impl From<SwitchArg> for Switch {
    fn from(arg: SwitchArg) -> Self {
        match arg {
            SwitchArg::On => Switch::On,
            SwitchArg::Off => Switch::Off,
        }
    }
}

impl Commands {
    /// Whether the command talks to the database
    pub fn needs_database(&self) -> bool {
        !matches!(self, Commands::Notify { .. })
    }

    /// Flag and position for the toggle commands
    pub fn flag_change(&self) -> Option<(GlobalFlag, Switch)> {
        match self {
            Commands::ReadOnly { state } => Some((GlobalFlag::ReadOnly, (*state).into())),
            Commands::SuperReadOnly { state } => Some((GlobalFlag::SuperReadOnly, (*state).into())),
            Commands::EventScheduler { state } => {
                Some((GlobalFlag::EventScheduler, (*state).into()))
            }
            _ => None,
        }
    }
}
