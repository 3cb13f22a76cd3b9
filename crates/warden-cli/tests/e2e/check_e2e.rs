//! Single polled checks against a live cluster
//!
//! ```bash
//! cargo test --features cluster-e2e --test e2e test_check -- --ignored --nocapture
//! ```

#![cfg(feature = "cluster-e2e")]

use clap::Parser;
use warden_cli::{Cli, Commands};

use super::context::{connect, init_e2e_test};

fn check_args(argv: &[&str]) -> warden_cli::commands::check::CheckArgs {
    let mut full = vec!["warden", "check"];
    full.extend_from_slice(argv);
    match Cli::parse_from(full).command {
        Commands::Check(args) => args,
        other => panic!("expected check arguments, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn test_check_admin_can_create_pods_in_default() {
    init_e2e_test();
    let ctx = connect().await.unwrap();
    let args = check_args(&[
        "--kind", "subject", "--namespace", "default",
        "--verb", "create", "--resource", "pods", "--expect-allowed",
    ]);
    warden_cli::commands::check::run(&ctx, args).await.unwrap();
}

/// Self reviews do not reveal whether a namespace exists
#[tokio::test]
#[ignore]
async fn test_check_anonymous_denied_in_nonexistent_namespace() {
    init_e2e_test();
    let ctx = connect().await.unwrap();
    let args = check_args(&[
        "--kind", "subject", "--namespace", "nonexistent-project", "--anonymous",
        "--verb", "create", "--resource", "pods", "--expect-denied",
    ]);
    warden_cli::commands::check::run(&ctx, args).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_check_anonymous_cannot_review_cluster_wide() {
    init_e2e_test();
    let ctx = connect().await.unwrap();
    let args = check_args(&[
        "--kind", "subject", "--anonymous", "--surface", "kube", "--user", "someone",
        "--verb", "get", "--resource", "projects",
        "--expect-error",
        r#"subjectaccessreviews.authorization.k8s.io is forbidden: User "system:anonymous""#,
        "--prefix",
    ]);
    warden_cli::commands::check::run(&ctx, args).await.unwrap();
}
