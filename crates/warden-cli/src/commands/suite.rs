//! `warden suite`: run built-in scenario suites

use clap::Args;
use tracing::info;
use warden_review::ScenarioReport;

use crate::context::ClusterContext;
use crate::fixtures::Fixtures;
use crate::suites::SuiteName;
use crate::{Error, Result};

/// Arguments for `warden suite`
#[derive(Args, Debug)]
pub struct SuiteArgs {
    /// Suite to run
    #[arg(value_enum, default_value_t = SuiteName::All)]
    pub suite: SuiteName,

    /// Leave created projects in place after the run
    #[arg(long)]
    pub keep: bool,
}

/// Run every selected suite to completion, then fail if any step failed
pub async fn run(ctx: &ClusterContext, args: SuiteArgs) -> Result<()> {
    let mut failures = Vec::new();

    for suite in args.suite.expand() {
        let report = ScenarioReport::new(suite.as_str());
        let mut fixtures = Fixtures::new(ctx).await?;

        if let Err(e) = suite.run(ctx, &mut fixtures, &report).await {
            report.error(format!("provisioning failed: {}", e));
        }

        if args.keep {
            let kept = fixtures.keep();
            if !kept.is_empty() {
                info!(suite = %suite.as_str(), projects = ?kept, "Keeping projects");
            }
        }
        fixtures.cleanup().await;

        if let Err(e) = report.finish() {
            failures.push(e);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::suite_failed(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SuiteArgs,
    }

    #[test]
    fn suite_defaults_to_all() {
        let cli = TestCli::try_parse_from(["suite"]).unwrap();
        assert_eq!(cli.args.suite, SuiteName::All);
        assert!(!cli.args.keep);
    }

    #[test]
    fn suite_names_are_kebab_case() {
        let cli = TestCli::try_parse_from(["suite", "browser-safe", "--keep"]).unwrap();
        assert_eq!(cli.args.suite, SuiteName::BrowserSafe);
        assert!(cli.args.keep);
        assert!(TestCli::try_parse_from(["suite", "browser_safe"]).is_err());
    }
}
