//! Print the effective configuration

use anyhow::{Context as _, Result};
use clap::Args;
use facial_affect_classifier::SessionConfig;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigCommand {
    /// Validate and print this file instead of the defaults
    #[arg(long, value_name = "FILE")]
    from: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        let config = match &self.from {
            Some(path) => SessionConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SessionConfig::default(),
        };
        print!("{}", config.to_yaml()?);
        Ok(())
    }
}
