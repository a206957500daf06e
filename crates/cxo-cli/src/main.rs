use clap::Parser;
use tracing::Level;

mod cli;
mod commands;
mod config;
mod sample;

use config::CliConfig;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if let Some(format) = cli.format {
        config.format = format;
    }
    let level = if cli.verbose { Level::DEBUG } else { config.level()? };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    commands::run_command(cli.command, &config)
}
