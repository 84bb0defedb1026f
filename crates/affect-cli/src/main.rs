//! Affect CLI - Facial emotion classification from recorded blendshapes
//!
//! Command-line interface for replaying recorded landmark output through the
//! emotion classifier.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::config::ConfigCommand;
use commands::replay::ReplayCommand;

#[derive(Parser)]
#[command(
    name = "affect",
    version,
    about = "Real-time facial emotion classification from blendshape scores",
    after_help = "EXAMPLES:\n  \
                  # Replay a recorded session\n  \
                  affect replay session.jsonl\n\n  \
                  # Replay with a custom configuration, JSON output\n  \
                  affect replay --config tuned.yaml --json session.jsonl\n\n  \
                  # Print the default configuration\n  \
                  affect config > affect.yaml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded blendshape frames (JSONL) through the classifier
    Replay(ReplayCommand),

    /// Print the default configuration as YAML
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match &cli.command {
        Commands::Config(_) => Level::WARN,
        _ => {
            if cli.verbose {
                Level::DEBUG
            } else {
                Level::INFO
            }
        }
    };

    // Results go to stdout, logs to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Replay(cmd) => cmd.execute().await,
        Commands::Config(cmd) => cmd.execute(),
    }
}
