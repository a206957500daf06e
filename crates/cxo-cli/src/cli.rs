use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "cxo",
    about = "CXO: inspect schema registries, encoded data and node messages",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format; overrides the config file
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode an encoded registry and list its schemas
    Registry(RegistryArgs),
    /// Measure encoded data against a registered schema
    Size(SizeArgs),
    /// Decode a node message
    Message(MessageArgs),
    /// Write the built-in sample registry and a sample object
    Sample(SampleArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct RegistryArgs {
    /// File holding a canonical registry encoding
    pub path: PathBuf,
}

#[derive(Args)]
pub struct SizeArgs {
    /// File holding a canonical registry encoding
    #[arg(long)]
    pub registry: PathBuf,
    /// Registered schema name
    #[arg(long)]
    pub schema: String,
    /// File holding the encoded value
    pub data: PathBuf,
}

#[derive(Args)]
pub struct MessageArgs {
    /// File holding one encoded message
    pub path: PathBuf,
}

#[derive(Args)]
pub struct SampleArgs {
    /// Output directory
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}
