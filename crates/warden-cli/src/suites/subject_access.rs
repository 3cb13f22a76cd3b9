//! Subject access reviews across both surfaces
//!
//! Two projects, five users and anonymous. Covers who may submit reviews at
//! which scope, that answers name the granting binding, and that neither
//! the forbidden message nor a self review reveals whether a namespace
//! exists.

use warden_common::kube_utils::Identity;
use warden_common::ANONYMOUS_USER;
use warden_review::{AccessDecision, AccessQuery, Action, ScenarioReport, SubjectReviewCase};

use super::{
    cluster_review_forbidden, local_review_forbidden, role_binding_reason, run_subject_steps,
    SubjectStep, KUBE_AUTHZ_GROUP, OPENSHIFT_AUTHZ_GROUP,
};
use crate::context::ClusterContext;
use crate::fixtures::{unique_user, Fixtures};
use crate::Result;

const DEFAULT_NAMESPACE: &str = "default";
const NONEXISTENT_PROJECT: &str = "nonexistent-project";
const CLUSTER_ADMINS_GROUP: &str = "system:cluster-admins";

/// Generated names the catalogue refers to.
#[derive(Clone, Debug)]
pub struct Names {
    /// Project harold administers
    pub hammer: String,
    /// Project mark administers
    pub mallet: String,
    /// Admin of hammer
    pub harold: String,
    /// Admin of mallet
    pub mark: String,
    /// Viewer in the default namespace
    pub danny: String,
    /// Editor in mallet
    pub edgar: String,
    /// Viewer in hammer
    pub valerie: String,
    /// Binding that makes harold admin of hammer
    pub harold_admin: String,
    /// Binding that gives valerie view in hammer
    pub valerie_view: String,
    /// Binding that gives edgar edit in mallet
    pub edgar_edit: String,
    /// Binding that gives anonymous edit in hammer
    pub anon_edit: String,
    /// Binding that gives danny view in default
    pub danny_view: String,
}

async fn provision(fixtures: &mut Fixtures<'_>) -> Result<Names> {
    let hammer = fixtures.create_project("hammer-project-").await?;
    let mallet = fixtures.create_project("mallet-project-").await?;

    let harold = unique_user("harold-");
    let mark = unique_user("mark-");
    let danny = unique_user("danny-");
    let edgar = unique_user("edgar-");
    let valerie = unique_user("valerie-");

    let harold_admin = fixtures.add_admin(&hammer, &harold).await?;
    let valerie_view = fixtures.add_view(&hammer, &valerie).await?;
    fixtures.add_admin(&mallet, &mark).await?;
    let edgar_edit = fixtures.add_edit(&mallet, &edgar).await?;
    let anon_edit = fixtures.add_edit(&hammer, ANONYMOUS_USER).await?;
    let danny_view = fixtures.add_view(DEFAULT_NAMESPACE, &danny).await?;

    Ok(Names {
        hammer,
        mallet,
        harold,
        mark,
        danny,
        edgar,
        valerie,
        harold_admin,
        valerie_view,
        edgar_edit,
        anon_edit,
        danny_view,
    })
}

fn both_forbidden(case: SubjectReviewCase, openshift: String, kube: String) -> SubjectReviewCase {
    case.expect_error(openshift).expect_kube_error(kube)
}

fn cluster_forbidden(case: SubjectReviewCase, user: &str) -> SubjectReviewCase {
    both_forbidden(
        case,
        cluster_review_forbidden(OPENSHIFT_AUTHZ_GROUP, user),
        cluster_review_forbidden(KUBE_AUTHZ_GROUP, user),
    )
}

fn local_forbidden(case: SubjectReviewCase, user: &str, namespace: &str) -> SubjectReviewCase {
    both_forbidden(
        case,
        local_review_forbidden(OPENSHIFT_AUTHZ_GROUP, user, namespace),
        local_review_forbidden(KUBE_AUTHZ_GROUP, user, namespace),
    )
    .kube_namespace(namespace)
}

/// The full catalogue, in run order
pub fn steps(n: &Names) -> Vec<SubjectStep> {
    let admin = Identity::Configured;
    let anonymous = Identity::Anonymous;
    let harold = Identity::user(&n.harold);
    let mark = Identity::user(&n.mark);
    let danny = Identity::user(&n.danny);

    let get_projects = Action::new("get", "projects");
    let can_danny_get_project = AccessQuery::for_user(&n.danny, get_projects.clone());
    let can_valerie_get_project = AccessQuery::for_user(&n.valerie, get_projects);
    let can_edgar_delete_pods = AccessQuery::for_user(&n.edgar, Action::new("delete", "pods"));
    let can_harold_update_project =
        AccessQuery::for_user(&n.harold, Action::new("update", "projects"));
    let can_cluster_admins_create_project =
        AccessQuery::for_groups([CLUSTER_ADMINS_GROUP], Action::new("create", "projects"));
    let can_i_create_pods = AccessQuery::for_caller(Action::new("create", "pods"));
    let can_i_create_policy_bindings =
        AccessQuery::for_caller(Action::new("create", "policybindings"));

    vec![
        SubjectStep::new(
            admin.clone(),
            SubjectReviewCase::local(
                "cluster admin told danny can get project default",
                DEFAULT_NAMESPACE,
                can_danny_get_project.clone(),
            )
            .expect(AccessDecision::allowed(
                DEFAULT_NAMESPACE,
                role_binding_reason(&n.danny_view, DEFAULT_NAMESPACE, "view", &n.danny),
            )),
        ),
        SubjectStep::new(
            admin.clone(),
            SubjectReviewCase::cluster(
                "cluster admin told danny cannot get projects cluster-wide",
                can_danny_get_project.clone(),
            )
            .expect(AccessDecision::denied("")),
        ),
        SubjectStep::new(
            danny.clone(),
            cluster_forbidden(
                SubjectReviewCase::cluster(
                    "as danny, can I make cluster subject access reviews",
                    can_danny_get_project.clone(),
                ),
                &n.danny,
            ),
        ),
        SubjectStep::new(
            anonymous.clone(),
            cluster_forbidden(
                SubjectReviewCase::cluster(
                    "as anonymous, can I make cluster subject access reviews",
                    can_danny_get_project,
                ),
                ANONYMOUS_USER,
            ),
        ),
        SubjectStep::new(
            harold.clone(),
            SubjectReviewCase::local(
                "harold told valerie can get project hammer-project",
                &n.hammer,
                can_valerie_get_project.clone(),
            )
            .expect(AccessDecision::allowed(
                &n.hammer,
                role_binding_reason(&n.valerie_view, &n.hammer, "view", &n.valerie),
            )),
        ),
        SubjectStep::new(
            mark.clone(),
            SubjectReviewCase::local(
                "mark told valerie cannot get project mallet-project",
                &n.mallet,
                can_valerie_get_project,
            )
            .expect(AccessDecision::denied(&n.mallet)),
        ),
        SubjectStep::new(
            mark,
            SubjectReviewCase::local(
                "mark told edgar can delete pods in mallet-project",
                &n.mallet,
                can_edgar_delete_pods.clone(),
            )
            .expect(AccessDecision::allowed(
                &n.mallet,
                role_binding_reason(&n.edgar_edit, &n.mallet, "edit", &n.edgar),
            )),
        ),
        SubjectStep::new(
            harold.clone(),
            local_forbidden(
                SubjectReviewCase::local(
                    "harold denied ability to run subject access review in project mallet-project",
                    &n.mallet,
                    can_edgar_delete_pods.clone(),
                ),
                &n.harold,
                &n.mallet,
            ),
        ),
        SubjectStep::new(
            anonymous.clone(),
            local_forbidden(
                SubjectReviewCase::local(
                    "system:anonymous denied ability to run subject access review in project mallet-project",
                    &n.mallet,
                    can_edgar_delete_pods.clone(),
                ),
                ANONYMOUS_USER,
                &n.mallet,
            ),
        ),
        SubjectStep::new(
            harold.clone(),
            local_forbidden(
                SubjectReviewCase::local(
                    "harold denied ability to run subject access review in project nonexistent-project",
                    NONEXISTENT_PROJECT,
                    can_edgar_delete_pods.clone(),
                ),
                &n.harold,
                NONEXISTENT_PROJECT,
            ),
        ),
        SubjectStep::new(
            anonymous.clone(),
            local_forbidden(
                SubjectReviewCase::local(
                    "system:anonymous denied ability to run subject access review in project nonexistent-project",
                    NONEXISTENT_PROJECT,
                    can_edgar_delete_pods,
                ),
                ANONYMOUS_USER,
                NONEXISTENT_PROJECT,
            ),
        ),
        SubjectStep::new(
            harold.clone(),
            SubjectReviewCase::local(
                "harold told harold can update project hammer-project",
                &n.hammer,
                can_harold_update_project,
            )
            .expect(AccessDecision::allowed(
                &n.hammer,
                role_binding_reason(&n.harold_admin, &n.hammer, "admin", &n.harold),
            )),
        ),
        SubjectStep::new(
            admin,
            SubjectReviewCase::cluster(
                "cluster admin told cluster admins can create projects",
                can_cluster_admins_create_project.clone(),
            )
            .expect(AccessDecision::allowed(
                "",
                r#"RBAC: allowed by ClusterRoleBinding "cluster-admins" of ClusterRole "cluster-admin" to Group "system:cluster-admins""#,
            )),
        ),
        SubjectStep::new(
            harold.clone(),
            cluster_forbidden(
                SubjectReviewCase::cluster(
                    "harold denied ability to run cluster subject access review",
                    can_cluster_admins_create_project,
                ),
                &n.harold,
            ),
        ),
        SubjectStep::new(
            harold.clone(),
            SubjectReviewCase::local(
                "harold told he can create pods in project hammer-project",
                &n.hammer,
                can_i_create_pods.clone(),
            )
            .expect(AccessDecision::allowed(
                &n.hammer,
                role_binding_reason(&n.harold_admin, &n.hammer, "admin", &n.harold),
            )),
        ),
        SubjectStep::new(
            anonymous.clone(),
            SubjectReviewCase::local(
                "system:anonymous told he can create pods in project hammer-project",
                &n.hammer,
                can_i_create_pods.clone(),
            )
            .expect(AccessDecision::allowed(
                &n.hammer,
                role_binding_reason(&n.anon_edit, &n.hammer, "edit", ANONYMOUS_USER),
            )),
        ),
        SubjectStep::new(
            harold.clone(),
            SubjectReviewCase::local(
                "harold told he cannot create pods in project mallet-project",
                &n.mallet,
                can_i_create_pods.clone(),
            )
            .expect(AccessDecision::denied(&n.mallet)),
        ),
        SubjectStep::new(
            anonymous.clone(),
            SubjectReviewCase::local(
                "system:anonymous told he cannot create pods in project mallet-project",
                &n.mallet,
                can_i_create_pods.clone(),
            )
            .expect(AccessDecision::denied(&n.mallet)),
        ),
        SubjectStep::new(
            harold.clone(),
            SubjectReviewCase::local(
                "harold told he cannot create pods in project nonexistent-project",
                NONEXISTENT_PROJECT,
                can_i_create_pods.clone(),
            )
            .expect(AccessDecision::denied(NONEXISTENT_PROJECT)),
        ),
        SubjectStep::new(
            anonymous,
            SubjectReviewCase::local(
                "system:anonymous told he cannot create pods in project nonexistent-project",
                NONEXISTENT_PROJECT,
                can_i_create_pods,
            )
            .expect(AccessDecision::denied(NONEXISTENT_PROJECT)),
        ),
        SubjectStep::new(
            harold,
            SubjectReviewCase::local(
                "harold told he can create policybindings in project hammer-project",
                &n.hammer,
                can_i_create_policy_bindings,
            )
            .expect(AccessDecision::denied(&n.hammer)),
        ),
    ]
}

/// Provision projects and grants, then run the catalogue
pub async fn run(
    ctx: &ClusterContext,
    fixtures: &mut Fixtures<'_>,
    report: &ScenarioReport,
) -> Result<()> {
    let names = provision(fixtures).await?;
    run_subject_steps(ctx, report, &steps(&names)).await;
    Ok(())
}
