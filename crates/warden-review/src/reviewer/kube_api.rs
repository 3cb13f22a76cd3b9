//! `authorization.k8s.io/v1` review surface

use async_trait::async_trait;
use k8s_openapi::api::authorization::v1::{
    LocalSubjectAccessReview, ResourceAttributes, SelfSubjectAccessReview,
    SelfSubjectAccessReviewSpec, SubjectAccessReview, SubjectAccessReviewSpec,
    SubjectAccessReviewStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, PostParams};
use kube::Client;
use tracing::debug;

use super::AccessReviewer;
use crate::decision::AccessDecision;
use crate::error::ReviewError;
use crate::query::{AccessQuery, Action, ReviewKind};

/// Subject reviews through the upstream authorization API.
///
/// Local queries without a principal become `SelfSubjectAccessReview`s so
/// they can be submitted by any authenticated or anonymous caller. Resource
/// ("who can") reviews have no upstream equivalent.
#[derive(Clone)]
pub struct KubeReviewer {
    client: Client,
}

impl KubeReviewer {
    /// Wrap a client already bound to the identity under test
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn ensure_supported(&self, kind: ReviewKind) -> Result<(), ReviewError> {
        match kind {
            ReviewKind::Subject => Ok(()),
            ReviewKind::Resource => Err(ReviewError::Unsupported {
                surface: self.surface(),
                kind: "resource access reviews".to_string(),
            }),
        }
    }
}

#[async_trait]
impl AccessReviewer for KubeReviewer {
    fn surface(&self) -> &'static str {
        "kube api"
    }

    async fn create_access_review(
        &self,
        kind: ReviewKind,
        query: &AccessQuery,
    ) -> Result<AccessDecision, ReviewError> {
        self.ensure_supported(kind)?;
        debug!(user = %query.user, verb = %query.action.verb, "Submitting SubjectAccessReview");

        let api: Api<SubjectAccessReview> = Api::all(self.client.clone());
        let created = api
            .create(&PostParams::default(), &subject_access_review(query))
            .await?;
        Ok(decision_from_status("", created.status))
    }

    async fn create_local_access_review(
        &self,
        kind: ReviewKind,
        namespace: &str,
        query: &AccessQuery,
    ) -> Result<AccessDecision, ReviewError> {
        self.ensure_supported(kind)?;

        let status = if query.is_self() {
            debug!(
                namespace = %namespace,
                verb = %query.action.verb,
                "Submitting SelfSubjectAccessReview"
            );
            let api: Api<SelfSubjectAccessReview> = Api::all(self.client.clone());
            api.create(
                &PostParams::default(),
                &self_subject_access_review(namespace, &query.action),
            )
            .await?
            .status
        } else {
            debug!(
                namespace = %namespace,
                user = %query.user,
                verb = %query.action.verb,
                "Submitting LocalSubjectAccessReview"
            );
            let api: Api<LocalSubjectAccessReview> =
                Api::namespaced(self.client.clone(), namespace);
            api.create(
                &PostParams::default(),
                &local_subject_access_review(namespace, query),
            )
            .await?
            .status
        };

        Ok(decision_from_status(namespace, status))
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn resource_attributes(namespace: Option<&str>, action: &Action) -> ResourceAttributes {
    ResourceAttributes {
        namespace: namespace.and_then(non_empty),
        verb: non_empty(&action.verb),
        group: non_empty(&action.group),
        version: non_empty(&action.version),
        resource: non_empty(&action.resource),
        name: non_empty(&action.resource_name),
        ..Default::default()
    }
}

fn subject_spec(namespace: Option<&str>, query: &AccessQuery) -> SubjectAccessReviewSpec {
    SubjectAccessReviewSpec {
        user: non_empty(&query.user),
        groups: (!query.groups.is_empty()).then(|| query.groups.clone()),
        resource_attributes: Some(resource_attributes(namespace, &query.action)),
        ..Default::default()
    }
}

fn subject_access_review(query: &AccessQuery) -> SubjectAccessReview {
    let namespace = non_empty(&query.action.namespace);
    SubjectAccessReview {
        spec: subject_spec(namespace.as_deref(), query),
        ..Default::default()
    }
}

fn local_subject_access_review(namespace: &str, query: &AccessQuery) -> LocalSubjectAccessReview {
    LocalSubjectAccessReview {
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: subject_spec(Some(namespace), query),
        ..Default::default()
    }
}

fn self_subject_access_review(namespace: &str, action: &Action) -> SelfSubjectAccessReview {
    SelfSubjectAccessReview {
        spec: SelfSubjectAccessReviewSpec {
            resource_attributes: Some(resource_attributes(Some(namespace), action)),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// The upstream status does not echo a namespace, so the decision carries
/// the one the review was evaluated in
fn decision_from_status(
    namespace: &str,
    status: Option<SubjectAccessReviewStatus>,
) -> AccessDecision {
    let status = status.unwrap_or_default();
    AccessDecision {
        allowed: status.allowed,
        reason: status.reason.unwrap_or_default(),
        evaluation_error: status.evaluation_error.unwrap_or_default(),
        namespace: namespace.to_string(),
        subjects: None,
    }
}
