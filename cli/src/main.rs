//! `fl-cli`: manage and inspect the Folio content store.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use folio_runtime::{init_tracing, LoggingOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Default to info-level logs; override via RUST_LOG if needed.
    let _log_guard = init_tracing(&LoggingOptions::from_env("cli.log"))?;

    let cli = cli::Cli::parse();
    commands::run(cli).await
}
