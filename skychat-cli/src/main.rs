//! Binary crate for the `skychat` terminal assistant.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and the chat REPL
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
