//! Cluster-reader coverage against a live cluster
//!
//! Discovery on a busy cluster includes aggregated and CRD-backed APIs the
//! reader role is not expected to track, so findings here are informative
//! rather than a reliable signal.
//!
//! ```bash
//! cargo test --features cluster-e2e --test e2e test_cluster_reader_coverage -- --ignored --nocapture
//! ```

#![cfg(feature = "cluster-e2e")]

use warden_cli::commands::coverage::{self, CoverageArgs};

use super::context::{connect, init_e2e_test};

#[tokio::test]
#[ignore]
async fn test_cluster_reader_coverage() {
    init_e2e_test();
    let ctx = connect().await.unwrap();
    coverage::run(
        &ctx,
        CoverageArgs {
            role: "cluster-reader".to_string(),
        },
    )
    .await
    .unwrap();
}
