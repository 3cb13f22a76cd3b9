//! Warden CLI library

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod fixtures;
pub mod suites;

pub use error::{Error, Result};

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warden_common::telemetry::LogFormat;

use crate::context::ClusterContext;

/// Warden - authorization conformance checks for a live cluster
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Kubeconfig for the admin identity
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Config file (default: ~/.warden/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Warden subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll one access review until it matches
    Check(commands::check::CheckArgs),
    /// Run built-in scenario suites
    Suite(commands::suite::SuiteArgs),
    /// Compare the cluster-reader role against served resources
    Coverage(commands::coverage::CoverageArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        let config = config::load(self.config.as_deref())?;
        let kubeconfig = config::resolve_kubeconfig(self.kubeconfig.as_deref(), &config);
        let ctx = ClusterContext::connect(kubeconfig.as_deref(), &config).await?;

        match self.command {
            Commands::Check(args) => commands::check::run(&ctx, args).await,
            Commands::Suite(args) => commands::suite::run(&ctx, args).await,
            Commands::Coverage(args) => commands::coverage::run(&ctx, args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "warden",
            "suite",
            "api-group",
            "--log-format",
            "json",
            "--kubeconfig",
            "/tmp/admin.kubeconfig",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(
            cli.kubeconfig.as_deref(),
            Some(std::path::Path::new("/tmp/admin.kubeconfig"))
        );
        assert!(matches!(cli.command, Commands::Suite(_)));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = Cli::try_parse_from(["warden", "--log-format", "xml", "coverage"]).unwrap_err();
        assert!(err.to_string().contains("unknown log format"));
    }

    #[test]
    fn command_tree_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
