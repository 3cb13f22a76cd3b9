//! Subject reviews honor the API group
//!
//! harold is admin of one project. Asking about horizontalpodautoscalers in
//! `autoscaling` is allowed; the same resource under the core group, an
//! unknown group or `*` is not. The cluster admin's own review is allowed
//! regardless of group.

use warden_common::kube_utils::Identity;
use warden_review::{AccessDecision, AccessQuery, Action, ScenarioReport, SubjectReviewCase};

use super::{role_binding_reason, run_subject_steps, SubjectStep};
use crate::context::ClusterContext;
use crate::fixtures::{unique_user, Fixtures};
use crate::Result;

const HPA: &str = "horizontalpodautoscalers";
const ANY_PROJECT: &str = "any-project";

/// Label and group of each API group variant that must not match
const GROUP_VARIANTS: [(&str, &str); 3] = [
    ("no API group", ""),
    ("invalid API group", "foo"),
    ("* API group", "*"),
];

/// Generated names the catalogue refers to.
#[derive(Clone, Debug)]
pub struct Names {
    /// Project harold administers
    pub hammer: String,
    /// The project admin
    pub harold: String,
    /// Generated name of harold's admin binding
    pub harold_admin: String,
}

fn get_hpa(group: &str) -> Action {
    Action::new("get", HPA).in_group(group)
}

/// The full catalogue, in run order
pub fn steps(n: &Names) -> Vec<SubjectStep> {
    let harold_reason = role_binding_reason(&n.harold_admin, &n.hammer, "admin", &n.harold);
    let for_harold = |group: &str| AccessQuery::for_user(&n.harold, get_hpa(group));

    let mut steps = vec![SubjectStep::new(
        Identity::Configured,
        SubjectReviewCase::local(
            "cluster admin told harold can get autoscaling.horizontalpodautoscalers in project hammer-project",
            &n.hammer,
            for_harold("autoscaling"),
        )
        .expect(AccessDecision::allowed(&n.hammer, harold_reason)),
    )];

    for (label, group) in GROUP_VARIANTS {
        steps.push(SubjectStep::new(
            Identity::Configured,
            SubjectReviewCase::local(
                format!(
                    "cluster admin told harold cannot get horizontalpodautoscalers (with {}) in project hammer-project",
                    label
                ),
                &n.hammer,
                for_harold(group),
            )
            .expect(AccessDecision::denied(&n.hammer)),
        ));
    }

    steps.push(SubjectStep::new(
        Identity::Configured,
        SubjectReviewCase::local(
            "cluster admin told they can get autoscaling.horizontalpodautoscalers in project hammer-project",
            ANY_PROJECT,
            AccessQuery::for_caller(get_hpa("autoscaling")),
        )
        .expect(AccessDecision::allowed(ANY_PROJECT, "")),
    ));

    for (label, group) in GROUP_VARIANTS {
        steps.push(SubjectStep::new(
            Identity::Configured,
            SubjectReviewCase::local(
                format!(
                    "cluster admin told they can get horizontalpodautoscalers (with {}) in project any-project",
                    label
                ),
                ANY_PROJECT,
                AccessQuery::for_caller(get_hpa(group)),
            )
            .expect(AccessDecision::allowed(ANY_PROJECT, "")),
        ));
    }

    steps
}

/// Provision the project and grant, then run the catalogue
pub async fn run(
    ctx: &ClusterContext,
    fixtures: &mut Fixtures<'_>,
    report: &ScenarioReport,
) -> Result<()> {
    let hammer = fixtures.create_project("hammer-project-").await?;
    let harold = unique_user("harold-");
    let harold_admin = fixtures.add_admin(&hammer, &harold).await?;

    let names = Names {
        hammer,
        harold,
        harold_admin,
    };
    run_subject_steps(ctx, report, &steps(&names)).await;
    Ok(())
}
