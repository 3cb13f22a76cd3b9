//! Warden CLI
//!
//! Runs authorization conformance checks against a live cluster.

use clap::Parser;

use warden_cli::commands::CommandErrorExt;
use warden_cli::{Cli, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    warden_common::telemetry::init_logging(cli.log_format).cmd_err()?;
    cli.run().await
}
