//! `warden coverage`: compare a reader role against discovery

use clap::Args;
use k8s_openapi::api::rbac::v1::ClusterRole;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::{Api, Client};
use tracing::{error, info, warn};
use warden_review::coverage::{
    analyze, discovered_resources, escalating_resources, non_reading_resources,
};

use super::CommandErrorExt;
use crate::context::ClusterContext;
use crate::{Error, Result};

/// Arguments for `warden coverage`
#[derive(Args, Debug)]
pub struct CoverageArgs {
    /// Reader cluster role to analyze
    #[arg(long, default_value = "cluster-reader")]
    pub role: String,
}

/// Every resource list the server advertises. Groups whose discovery fails
/// (an aggregated API that is down) are skipped with a warning.
async fn discover(client: &Client) -> Result<Vec<APIResourceList>> {
    let mut lists = Vec::new();

    let core = client.list_core_api_versions().await.cmd_err()?;
    for version in &core.versions {
        lists.push(client.list_core_api_resources(version).await.cmd_err()?);
    }

    let groups = client.list_api_groups().await.cmd_err()?;
    for group in &groups.groups {
        for version in &group.versions {
            match client.list_api_group_resources(&version.group_version).await {
                Ok(list) => lists.push(list),
                Err(e) => warn!(
                    group_version = %version.group_version,
                    error = %e,
                    "Skipping API group that failed discovery"
                ),
            }
        }
    }
    Ok(lists)
}

/// Fail when the reader role misses a readable resource or grants an escalating one
pub async fn run(ctx: &ClusterContext, args: CoverageArgs) -> Result<()> {
    let client = ctx.admin();
    let lists = discover(client).await?;

    let roles: Api<ClusterRole> = Api::all(client.clone());
    let role = roles.get(&args.role).await.cmd_err()?;
    let rules = role.rules.unwrap_or_default();

    let discovered = discovered_resources(&lists);
    let report = analyze(
        &discovered,
        &rules,
        &escalating_resources(),
        &non_reading_resources(),
    );

    if report.is_clean() {
        info!(
            role = %args.role,
            resources = discovered.len(),
            "Reader role covers every readable resource"
        );
        return Ok(());
    }

    let messages = report.messages();
    for message in &messages {
        error!(role = %args.role, "{}", message);
    }
    Err(Error::suite_failed(format!(
        "{} coverage finding(s) for role {}",
        messages.len(),
        args.role
    )))
}
