//! "Who can get deploymentconfigs" reviews
//!
//! Each project admin sees its own members plus the requester and the
//! baseline readers. A project admin may not ask cluster-wide; the cluster
//! admin may, and sees only the baseline readers.

use warden_common::kube_utils::Identity;
use warden_review::{
    AccessDecision, Action, BaselineReaders, ResourceReviewCase, ScenarioReport, SubjectSets,
};

use super::{run_resource_steps, ResourceStep};
use crate::context::ClusterContext;
use crate::fixtures::{unique_user, Fixtures};
use crate::Result;

/// Generated names the catalogue refers to.
#[derive(Clone, Debug)]
pub struct Names {
    /// Identity that created both projects
    pub requester: String,
    /// Project harold administers and valerie views
    pub hammer: String,
    /// Project mark administers and edgar edits
    pub mallet: String,
    /// Admin of hammer
    pub harold: String,
    /// Admin of mallet
    pub mark: String,
    /// Viewer in hammer
    pub valerie: String,
    /// Editor in mallet
    pub edgar: String,
}

fn who_can(baseline: &BaselineReaders, namespace: &str, users: &[&str]) -> AccessDecision {
    let no_groups: [&str; 0] = [];
    baseline.augment(AccessDecision::who_can(
        namespace,
        SubjectSets::new(users.iter().copied(), no_groups),
    ))
}

/// The full catalogue, in run order
pub fn steps(n: &Names, baseline: &BaselineReaders) -> Vec<ResourceStep> {
    let get_deployment_configs = Action::new("get", "deploymentconfigs");

    vec![
        ResourceStep::new(
            Identity::user(&n.harold),
            ResourceReviewCase::local(
                "who can view deploymentconfigs in hammer by harold",
                &n.hammer,
                get_deployment_configs.clone(),
            )
            .expect(who_can(
                baseline,
                &n.hammer,
                &[n.requester.as_str(), n.harold.as_str(), n.valerie.as_str()],
            )),
        ),
        ResourceStep::new(
            Identity::user(&n.mark),
            ResourceReviewCase::local(
                "who can view deploymentconfigs in mallet by mark",
                &n.mallet,
                get_deployment_configs.clone(),
            )
            .expect(who_can(
                baseline,
                &n.mallet,
                &[n.requester.as_str(), n.mark.as_str(), n.edgar.as_str()],
            )),
        ),
        ResourceStep::new(
            Identity::user(&n.mark),
            ResourceReviewCase::cluster(
                "who can view deploymentconfigs in all by mark",
                get_deployment_configs.clone(),
            )
            .expect_error("cannot "),
        ),
        ResourceStep::new(
            Identity::Configured,
            ResourceReviewCase::cluster(
                "who can view deploymentconfigs in all by cluster-admin",
                get_deployment_configs,
            )
            .expect(who_can(baseline, "", &[])),
        ),
    ]
}

/// Provision projects and grants, then run the catalogue.
///
/// Skipped with a log line when the project authorization API is disabled.
pub async fn run(
    ctx: &ClusterContext,
    fixtures: &mut Fixtures<'_>,
    report: &ScenarioReport,
) -> Result<()> {
    if !ctx.openshift_api {
        tracing::info!(
            suite = %report.suite(),
            "Project authorization API disabled, skipping suite"
        );
        return Ok(());
    }

    let hammer = fixtures.create_project("hammer-project-").await?;
    let harold = unique_user("harold-");
    fixtures.add_admin(&hammer, &harold).await?;

    let mallet = fixtures.create_project("mallet-project-").await?;
    let mark = unique_user("mark-");
    fixtures.add_admin(&mallet, &mark).await?;

    let valerie = unique_user("valerie-");
    fixtures.add_view(&hammer, &valerie).await?;
    let edgar = unique_user("edgar-");
    fixtures.add_edit(&mallet, &edgar).await?;

    let names = Names {
        requester: fixtures.requester().to_string(),
        hammer,
        mallet,
        harold,
        mark,
        valerie,
        edgar,
    };
    run_resource_steps(ctx, report, &steps(&names, &ctx.baseline)).await;
    Ok(())
}
