//! mydba - administrative helpers for MySQL-compatible servers

use clap::Parser;
use mydba_cli::{commands, Cli, MydbaConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => MydbaConfig::from_file(path)?,
        None => MydbaConfig::default(),
    };
    if let Some(url) = &cli.url {
        config = config.with_database_url(url.as_str());
    }

    // --log-level, then RUST_LOG, then the config file, then info
    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.log_level.as_deref().unwrap_or("info"))
        }),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut stdout = std::io::stdout();
    commands::run(&cli.command, &config, &mut stdout).await
}
