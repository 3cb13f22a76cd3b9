//! Provisioning helpers for suites
//!
//! Projects are plain namespaces created with `generateName`; users exist
//! only as impersonated names. Every grant waits until the grantee can see
//! the effect through a self access review, so scenarios start from a
//! converged cache.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::authentication::v1::SelfSubjectReview;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::api::rbac::v1::{RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, PostParams};
use kube::Api;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, warn};
use warden_common::retry::{retry_with_backoff_if, RetryConfig};
use warden_common::{FIELD_MANAGER, LABEL_CREATED_BY};
use warden_review::reviewer::submit;
use warden_review::{
    assert_eventually, AccessDecision, AccessQuery, Action, Expectation, KubeReviewer,
    PollFailure, PollSettings, ReviewKind, ReviewScope,
};

use crate::context::{identity_for, ClusterContext};
use crate::{Error, Result};

const RBAC_GROUP: &str = "rbac.authorization.k8s.io";

/// How long a fresh grant may take to reach the grantee
const GRANT_TIMEOUT: Duration = Duration::from_secs(60);

/// `prefix` plus a random lowercase suffix
pub fn unique_user(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}{}", prefix, suffix)
}

fn created_by_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(LABEL_CREATED_BY.to_string(), FIELD_MANAGER.to_string())])
}

/// RoleBinding named after `role` (with a generated suffix) granting the
/// cluster role to one user in `namespace`
pub fn role_binding(role: &str, namespace: &str, user: &str) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            generate_name: Some(role.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(created_by_labels()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: RBAC_GROUP.to_string(),
            kind: "ClusterRole".to_string(),
            name: role.to_string(),
        },
        subjects: Some(vec![Subject {
            api_group: Some(RBAC_GROUP.to_string()),
            kind: "User".to_string(),
            name: user.to_string(),
            namespace: None,
        }]),
    }
}

/// Namespace with a generated name starting with `prefix`
pub fn project(prefix: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            generate_name: Some(prefix.to_string()),
            labels: Some(created_by_labels()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A grant that never reached its grantee, with the last mismatch
fn grant_timeout(
    role: &str,
    namespace: &str,
    user: &str,
    failure: &PollFailure,
) -> warden_common::Error {
    warden_common::Error::timeout(
        format!(
            "{} in {} to reach {} (last: {})",
            role, namespace, user, failure.reason
        ),
        failure.timeout,
    )
}

fn generated_name(meta: &ObjectMeta, what: &str) -> Result<String> {
    meta.name
        .clone()
        .ok_or_else(|| Error::command_failed(format!("{} was created without a name", what)))
}

/// Name the configured identity authenticates as
pub async fn whoami(ctx: &ClusterContext) -> Result<String> {
    let api: Api<SelfSubjectReview> = Api::all(ctx.admin().clone());
    let review = retry_with_backoff_if(
        &RetryConfig::default(),
        "self_subject_review",
        || async {
            api.create(&PostParams::default(), &SelfSubjectReview::default())
                .await
                .map_err(warden_common::Error::from)
        },
        warden_common::Error::is_retryable,
    )
    .await?;
    review
        .status
        .and_then(|s| s.user_info)
        .and_then(|u| u.username)
        .ok_or_else(|| Error::command_failed("self subject review returned no username"))
}

/// Projects and grants made by one suite run.
///
/// Projects are remembered so [`Fixtures::cleanup`] can delete them.
pub struct Fixtures<'a> {
    ctx: &'a ClusterContext,
    requester: String,
    projects: Vec<String>,
}

impl<'a> Fixtures<'a> {
    /// Resolve the requesting identity and start with no projects
    pub async fn new(ctx: &'a ClusterContext) -> Result<Self> {
        let requester = whoami(ctx).await?;
        info!(requester = %requester, "Resolved requesting identity");
        Ok(Self {
            ctx,
            requester,
            projects: Vec::new(),
        })
    }

    /// The user the admin kubeconfig authenticates as
    pub fn requester(&self) -> &str {
        &self.requester
    }

    /// Create a project and make the requester its admin, the way a
    /// project request does. Returns the generated name.
    pub async fn create_project(&mut self, prefix: &str) -> Result<String> {
        let api: Api<Namespace> = Api::all(self.ctx.admin().clone());
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        let ns = project(prefix);
        let created = retry_with_backoff_if(
            &RetryConfig::default(),
            "create_project",
            || async { api.create(&pp, &ns).await.map_err(warden_common::Error::from) },
            warden_common::Error::is_retryable,
        )
        .await?;
        let name = generated_name(&created.metadata, "project")?;
        self.projects.push(name.clone());
        info!(project = %name, "Created project");

        self.bind_cluster_role("admin", &name, &self.requester).await?;
        Ok(name)
    }

    /// Create the binding without waiting for it to take effect
    async fn bind_cluster_role(&self, role: &str, namespace: &str, user: &str) -> Result<String> {
        let api: Api<RoleBinding> = Api::namespaced(self.ctx.admin().clone(), namespace);
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        let binding = role_binding(role, namespace, user);
        let created = retry_with_backoff_if(
            &RetryConfig::default(),
            "create_role_binding",
            || async {
                api.create(&pp, &binding)
                    .await
                    .map_err(warden_common::Error::from)
            },
            warden_common::Error::is_retryable,
        )
        .await?;
        let name = generated_name(&created.metadata, "role binding")?;
        info!(
            binding = %name,
            role = %role,
            namespace = %namespace,
            user = %user,
            "Bound cluster role"
        );
        Ok(name)
    }

    /// Grant `role` to `user` in `namespace` and wait until the user can
    /// get pods there. Returns the generated binding name.
    pub async fn grant_cluster_role(
        &self,
        role: &str,
        namespace: &str,
        user: &str,
    ) -> Result<String> {
        let name = self.bind_cluster_role(role, namespace, user).await?;

        let reviewer = KubeReviewer::new(self.ctx.client(&identity_for(user))?);
        let reviewer = &reviewer;
        let scope = &ReviewScope::Local(namespace.to_string());
        let query = &AccessQuery::for_caller(Action::new("get", "pods"));
        let expected = Expectation::decision(
            format!("{} can get pods in {}", user, namespace),
            AccessDecision::allowed(namespace, ""),
        );
        let settings = PollSettings::new(self.ctx.settings.interval, GRANT_TIMEOUT);

        assert_eventually(
            &expected.description,
            &settings,
            move || submit(reviewer, ReviewKind::Subject, scope, query),
            |outcome| expected.check(outcome),
        )
        .await
        .map_err(|failure| grant_timeout(role, namespace, user, &failure))?;
        Ok(name)
    }

    /// Make `user` an admin of `namespace`
    pub async fn add_admin(&self, namespace: &str, user: &str) -> Result<String> {
        self.grant_cluster_role("admin", namespace, user).await
    }

    /// Give `user` edit in `namespace`
    pub async fn add_edit(&self, namespace: &str, user: &str) -> Result<String> {
        self.grant_cluster_role("edit", namespace, user).await
    }

    /// Give `user` view in `namespace`
    pub async fn add_view(&self, namespace: &str, user: &str) -> Result<String> {
        self.grant_cluster_role("view", namespace, user).await
    }

    /// Delete every project this run created. Failures are logged only.
    pub async fn cleanup(self) {
        let api: Api<Namespace> = Api::all(self.ctx.admin().clone());
        for name in &self.projects {
            match api.delete(name, &DeleteParams::background()).await {
                Ok(_) => info!(project = %name, "Deleted project"),
                Err(e) => warn!(project = %name, error = %e, "Failed to delete project"),
            }
        }
    }

    /// Forget created projects so they survive the run
    pub fn keep(&mut self) -> Vec<String> {
        std::mem::take(&mut self.projects)
    }
}
