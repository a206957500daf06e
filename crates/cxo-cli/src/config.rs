use std::path::Path;

use anyhow::Context;
use cxo_protocol::MAX_MESSAGE_SIZE;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::cli::OutputFormat;

/// Settings read from the `--config` TOML file. Missing keys take their
/// defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub format: OutputFormat,
    /// Largest message the `message` command accepts.
    pub max_message_size: usize,
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            max_message_size: MAX_MESSAGE_SIZE,
            log_level: "warn".into(),
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn level(&self) -> anyhow::Result<Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid log level {:?}", self.log_level))
    }
}
