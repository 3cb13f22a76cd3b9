//! Built-in scenario suites
//!
//! Each suite provisions its projects and grants through [`Fixtures`], then
//! runs a fixed catalogue of cases. Catalogues are plain data built from the
//! generated names so they can be inspected without a cluster.

pub mod api_group;
pub mod browser_safe;
pub mod resource_access;
pub mod subject_access;

use clap::ValueEnum;
use warden_common::kube_utils::Identity;
use warden_review::{ResourceReviewCase, ScenarioReport, SubjectReviewCase};

use crate::context::ClusterContext;
use crate::fixtures::Fixtures;

/// API group of the project authorization surface
pub const OPENSHIFT_AUTHZ_GROUP: &str = "authorization.openshift.io";
/// API group of the kube authorization surface
pub const KUBE_AUTHZ_GROUP: &str = "authorization.k8s.io";

/// Suites selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SuiteName {
    /// "Who can" reviews by project admins and cluster admin
    ResourceAccess,
    /// Subject reviews across both surfaces
    SubjectAccess,
    /// Subject reviews honor the API group
    ApiGroup,
    /// Proxy requests without a token are rejected as unsafe
    BrowserSafe,
    /// Every suite in order
    All,
}

impl SuiteName {
    /// Concrete suites this selection runs, in order
    pub fn expand(self) -> Vec<SuiteName> {
        match self {
            SuiteName::All => vec![
                SuiteName::ResourceAccess,
                SuiteName::SubjectAccess,
                SuiteName::ApiGroup,
                SuiteName::BrowserSafe,
            ],
            other => vec![other],
        }
    }

    /// Name used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            SuiteName::ResourceAccess => "resource-access",
            SuiteName::SubjectAccess => "subject-access",
            SuiteName::ApiGroup => "api-group",
            SuiteName::BrowserSafe => "browser-safe",
            SuiteName::All => "all",
        }
    }

    /// Provision and run one concrete suite
    pub async fn run(
        self,
        ctx: &ClusterContext,
        fixtures: &mut Fixtures<'_>,
        report: &ScenarioReport,
    ) -> crate::Result<()> {
        match self {
            SuiteName::ResourceAccess => resource_access::run(ctx, fixtures, report).await,
            SuiteName::SubjectAccess => subject_access::run(ctx, fixtures, report).await,
            SuiteName::ApiGroup => api_group::run(ctx, fixtures, report).await,
            SuiteName::BrowserSafe => browser_safe::run(ctx, report).await,
            SuiteName::All => Ok(()),
        }
    }
}

/// A subject review case and the identity that submits it.
#[derive(Clone, Debug)]
pub struct SubjectStep {
    /// Who submits the review
    pub caller: Identity,
    /// What is asked and expected
    pub case: SubjectReviewCase,
}

impl SubjectStep {
    /// Pair a case with its caller
    pub fn new(caller: Identity, case: SubjectReviewCase) -> Self {
        Self { caller, case }
    }
}

/// A resource review case and the identity that submits it.
#[derive(Clone, Debug)]
pub struct ResourceStep {
    /// Who submits the review
    pub caller: Identity,
    /// What is asked and expected
    pub case: ResourceReviewCase,
}

impl ResourceStep {
    /// Pair a case with its caller
    pub fn new(caller: Identity, case: ResourceReviewCase) -> Self {
        Self { caller, case }
    }
}

/// Run subject steps in order, one report step each
pub async fn run_subject_steps(
    ctx: &ClusterContext,
    report: &ScenarioReport,
    steps: &[SubjectStep],
) {
    for step in steps {
        report
            .step(&step.case.description, || async {
                let surfaces = ctx.surfaces(&step.caller).map_err(|e| e.to_string())?;
                step.case.run(&surfaces, &ctx.settings, report).await;
                Ok(())
            })
            .await;
    }
}

/// Run resource steps in order against the project surface
pub async fn run_resource_steps(
    ctx: &ClusterContext,
    report: &ScenarioReport,
    steps: &[ResourceStep],
) {
    for step in steps {
        report
            .step(&step.case.description, || async {
                let reviewer = ctx.project_reviewer(&step.caller).map_err(|e| e.to_string())?;
                step.case.run(&reviewer, &ctx.settings, report).await;
                Ok(())
            })
            .await;
    }
}

/// Forbidden message for a cluster-scoped subject review
pub fn cluster_review_forbidden(group: &str, user: &str) -> String {
    format!(
        r#"subjectaccessreviews.{group} is forbidden: User "{user}" cannot create resource "subjectaccessreviews" in API group "{group}" at the cluster scope"#
    )
}

/// Forbidden message for a namespaced subject review
pub fn local_review_forbidden(group: &str, user: &str, namespace: &str) -> String {
    format!(
        r#"localsubjectaccessreviews.{group} is forbidden: User "{user}" cannot create resource "localsubjectaccessreviews" in API group "{group}" in the namespace "{namespace}""#
    )
}

/// RBAC reason for a grant through a namespaced binding to a cluster role
pub fn role_binding_reason(binding: &str, namespace: &str, role: &str, user: &str) -> String {
    format!(r#"RBAC: allowed by RoleBinding "{binding}/{namespace}" of ClusterRole "{role}" to User "{user}""#)
}
