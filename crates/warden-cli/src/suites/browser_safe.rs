//! Browser-safe proxy checks
//!
//! A user with credentials and an anonymous client both GET a pod proxy
//! path. Both are refused; only the anonymous refusal may mention the
//! unsafe-proxy rewrite.

use kube::Client;
use warden_common::kube_utils::Identity;
use warden_review::proxy::{anonymous_cases, run_case, token_cases, ProxyCase};
use warden_review::ScenarioReport;

use crate::context::ClusterContext;
use crate::fixtures::unique_user;
use crate::Result;

/// Pair every probe with the client it is sent by
pub fn plan(user_client: Client, anonymous_client: Client) -> Vec<(Client, ProxyCase)> {
    let mut plan: Vec<(Client, ProxyCase)> = token_cases()
        .into_iter()
        .map(|case| (user_client.clone(), case))
        .collect();
    plan.extend(
        anonymous_cases()
            .into_iter()
            .map(|case| (anonymous_client.clone(), case)),
    );
    plan
}

/// Build both clients and run every probe
pub async fn run(ctx: &ClusterContext, report: &ScenarioReport) -> Result<()> {
    let user = unique_user("someuser-");
    let user_client = ctx.client(&Identity::user(&user))?;
    let anonymous_client = ctx.client(&Identity::Anonymous)?;

    for (client, case) in plan(user_client, anonymous_client) {
        report.step(case.name, || run_case(&client, &case)).await;
    }
    Ok(())
}
