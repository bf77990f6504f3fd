//! invsync command-line runner.
//!
//! Usage:
//!   invsync locations --fixture buildings.json --inventory inventory.db
//!   invsync network --tenant t-1 --fixture network.json --inventory inventory.db --scope-db scope.db
//!   invsync scope list --scope-db scope.db
//!
//! Every command prints its result as pretty JSON on stdout.

use anyhow::Result;
use clap::Parser;
use invsync_cli::Cli;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let outcome = invsync_cli::execute(&cli).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.output)?);
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
