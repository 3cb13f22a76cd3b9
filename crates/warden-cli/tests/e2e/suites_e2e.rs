//! Built-in suites against a live cluster
//!
//! ```bash
//! cargo test --features cluster-e2e --test e2e test_subject_access_suite -- --ignored --nocapture
//! ```

#![cfg(feature = "cluster-e2e")]

use std::time::Duration;

use tracing::info;
use warden_cli::commands::suite::{self, SuiteArgs};
use warden_cli::suites::SuiteName;

use super::context::{connect, init_e2e_test};

const SUITE_TIMEOUT: Duration = Duration::from_secs(900);

async fn run_suite(name: SuiteName) {
    init_e2e_test();
    info!(suite = %name.as_str(), "Starting E2E suite");

    let result = tokio::time::timeout(SUITE_TIMEOUT, async {
        let ctx = connect().await?;
        suite::run(
            &ctx,
            SuiteArgs {
                suite: name,
                keep: false,
            },
        )
        .await
        .map_err(|e| e.to_string())
    })
    .await;

    match result {
        Ok(Ok(())) => info!("TEST PASSED: {}", name.as_str()),
        Ok(Err(e)) => panic!("{} suite failed: {}", name.as_str(), e),
        Err(_) => panic!("{} suite timed out after {:?}", name.as_str(), SUITE_TIMEOUT),
    }
}

#[tokio::test]
#[ignore]
async fn test_resource_access_suite() {
    run_suite(SuiteName::ResourceAccess).await;
}

#[tokio::test]
#[ignore]
async fn test_subject_access_suite() {
    run_suite(SuiteName::SubjectAccess).await;
}

#[tokio::test]
#[ignore]
async fn test_api_group_suite() {
    run_suite(SuiteName::ApiGroup).await;
}

#[tokio::test]
#[ignore]
async fn test_browser_safe_suite() {
    run_suite(SuiteName::BrowserSafe).await;
}
