//! # mydba-cli
//!
//! Library half of the `mydba` binary: argument parsing, configuration and
//! command execution, kept here so they can be tested without a process.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Commands, SwitchArg, VarCommands};
pub use config::MydbaConfig;
