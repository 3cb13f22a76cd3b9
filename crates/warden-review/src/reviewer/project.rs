//! `authorization.openshift.io/v1` review surface
//!
//! These review types have no typed bindings, so requests are built by hand
//! and sent through the kube client, which still handles auth, TLS and
//! mapping failure statuses to `kube::Error::Api`.

use async_trait::async_trait;
use kube::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AccessReviewer;
use crate::decision::{AccessDecision, SubjectSets};
use crate::error::ReviewError;
use crate::query::{AccessQuery, Action, ReviewKind};

const API_VERSION: &str = "authorization.openshift.io/v1";

/// Reviews submitted to the project authorization API.
#[derive(Clone)]
pub struct ProjectReviewer {
    client: Client,
}

impl ProjectReviewer {
    /// Wrap a client already bound to the identity under test
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        kind: ReviewKind,
        namespace: Option<&str>,
        query: &AccessQuery,
    ) -> Result<AccessDecision, ReviewError> {
        let request = review_request(kind, namespace, query)?;
        debug!(
            path = %request.uri(),
            user = %query.user,
            verb = %query.action.verb,
            resource = %query.action.resource,
            "Submitting project access review"
        );

        match kind {
            ReviewKind::Subject => {
                let resp: SubjectAccessReviewResponse = self.client.request(request).await?;
                Ok(resp.into())
            }
            ReviewKind::Resource => {
                let resp: ResourceAccessReviewResponse = self.client.request(request).await?;
                Ok(resp.into())
            }
        }
    }
}

#[async_trait]
impl AccessReviewer for ProjectReviewer {
    fn surface(&self) -> &'static str {
        "openshift api"
    }

    async fn create_access_review(
        &self,
        kind: ReviewKind,
        query: &AccessQuery,
    ) -> Result<AccessDecision, ReviewError> {
        self.send(kind, None, query).await
    }

    async fn create_local_access_review(
        &self,
        kind: ReviewKind,
        namespace: &str,
        query: &AccessQuery,
    ) -> Result<AccessDecision, ReviewError> {
        self.send(kind, Some(namespace), query).await
    }
}

/// Review object as posted; the action is inlined at the top level
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewBody {
    kind: &'static str,
    api_version: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    user: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<String>,
    #[serde(flatten)]
    action: Action,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SubjectAccessReviewResponse {
    namespace: String,
    allowed: bool,
    reason: String,
    evaluation_error: String,
}

impl From<SubjectAccessReviewResponse> for AccessDecision {
    fn from(resp: SubjectAccessReviewResponse) -> Self {
        AccessDecision {
            allowed: resp.allowed,
            reason: resp.reason,
            evaluation_error: resp.evaluation_error,
            namespace: resp.namespace,
            subjects: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResourceAccessReviewResponse {
    namespace: String,
    users: Option<Vec<String>>,
    groups: Option<Vec<String>>,
    // the server has always sent it misspelled
    #[serde(alias = "evalutionError")]
    evaluation_error: String,
}

impl From<ResourceAccessReviewResponse> for AccessDecision {
    fn from(resp: ResourceAccessReviewResponse) -> Self {
        let mut decision = AccessDecision::who_can(
            resp.namespace,
            SubjectSets::new(
                resp.users.unwrap_or_default(),
                resp.groups.unwrap_or_default(),
            ),
        );
        decision.evaluation_error = resp.evaluation_error;
        decision
    }
}

fn object_kind(kind: ReviewKind, local: bool) -> &'static str {
    match (kind, local) {
        (ReviewKind::Subject, false) => "SubjectAccessReview",
        (ReviewKind::Subject, true) => "LocalSubjectAccessReview",
        (ReviewKind::Resource, false) => "ResourceAccessReview",
        (ReviewKind::Resource, true) => "LocalResourceAccessReview",
    }
}

fn review_path(kind: ReviewKind, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("/apis/{}/namespaces/{}/{}", API_VERSION, ns, kind.local_resource()),
        None => format!("/apis/{}/{}", API_VERSION, kind.cluster_resource()),
    }
}

fn review_request(
    kind: ReviewKind,
    namespace: Option<&str>,
    query: &AccessQuery,
) -> Result<http::Request<Vec<u8>>, ReviewError> {
    // resource reviews have no principal; they always ask about everyone
    let (user, groups) = match kind {
        ReviewKind::Subject => (query.user.clone(), query.groups.clone()),
        ReviewKind::Resource => (String::new(), Vec::new()),
    };
    let body = ReviewBody {
        kind: object_kind(kind, namespace.is_some()),
        api_version: API_VERSION,
        user,
        groups,
        action: query.action.clone(),
    };
    let bytes = serde_json::to_vec(&body).map_err(|e| ReviewError::Decode(e.to_string()))?;

    http::Request::post(review_path(kind, namespace))
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::ACCEPT, "application/json")
        .body(bytes)
        .map_err(|e| ReviewError::Transport(format!("invalid review request: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_json(req: &http::Request<Vec<u8>>) -> serde_json::Value {
        serde_json::from_slice(req.body()).unwrap()
    }

    #[test]
    fn local_subject_review_posts_to_namespaced_path() {
        let query = AccessQuery::for_user("valerie", Action::new("get", "projects"));
        let req = review_request(ReviewKind::Subject, Some("hammer"), &query).unwrap();

        assert_eq!(req.method(), http::Method::POST);
        assert_eq!(
            req.uri().path(),
            "/apis/authorization.openshift.io/v1/namespaces/hammer/localsubjectaccessreviews"
        );
        let json = body_json(&req);
        assert_eq!(json["kind"], "LocalSubjectAccessReview");
        assert_eq!(json["apiVersion"], "authorization.openshift.io/v1");
        assert_eq!(json["user"], "valerie");
        assert_eq!(json["verb"], "get");
        assert_eq!(json["resource"], "projects");
        assert_eq!(json["resourceAPIGroup"], "");
        assert!(json.get("groups").is_none());
    }

    #[test]
    fn cluster_group_review_carries_groups() {
        let query =
            AccessQuery::for_groups(["system:cluster-admins"], Action::new("create", "projects"));
        let req = review_request(ReviewKind::Subject, None, &query).unwrap();
        assert_eq!(
            req.uri().path(),
            "/apis/authorization.openshift.io/v1/subjectaccessreviews"
        );
        let json = body_json(&req);
        assert_eq!(json["kind"], "SubjectAccessReview");
        assert_eq!(json["groups"][0], "system:cluster-admins");
        assert!(json.get("user").is_none());
    }

    #[test]
    fn resource_review_drops_the_principal() {
        let query = AccessQuery::for_user("ignored", Action::new("get", "deploymentconfigs"));
        let req = review_request(ReviewKind::Resource, Some("mallet"), &query).unwrap();
        assert!(req.uri().path().ends_with("/namespaces/mallet/localresourceaccessreviews"));
        let json = body_json(&req);
        assert_eq!(json["kind"], "LocalResourceAccessReview");
        assert!(json.get("user").is_none());

        let req = review_request(ReviewKind::Resource, None, &query).unwrap();
        assert!(req.uri().path().ends_with("/v1/resourceaccessreviews"));
    }

    #[test]
    fn subject_response_maps_to_decision() {
        let resp: SubjectAccessReviewResponse = serde_json::from_str(
            r#"{"kind":"SubjectAccessReviewResponse","namespace":"hammer","allowed":true,"reason":"RBAC: allowed by RoleBinding"}"#,
        )
        .unwrap();
        let decision = AccessDecision::from(resp);
        assert_eq!(decision, AccessDecision::allowed("hammer", "RBAC: allowed by RoleBinding"));
    }

    #[test]
    fn denied_subject_response_may_omit_everything() {
        let resp: SubjectAccessReviewResponse =
            serde_json::from_str(r#"{"namespace":"nonexistent-project"}"#).unwrap();
        assert_eq!(AccessDecision::from(resp), AccessDecision::denied("nonexistent-project"));
    }

    #[test]
    fn resource_response_accepts_the_server_spelling() {
        let resp: ResourceAccessReviewResponse = serde_json::from_str(
            r#"{"namespace":"hammer","users":["harold","valerie"],"groups":null,"evalutionError":"role missing"}"#,
        )
        .unwrap();
        let decision = AccessDecision::from(resp);
        assert_eq!(decision.users().collect::<Vec<_>>(), vec!["harold", "valerie"]);
        assert_eq!(decision.groups().count(), 0);
        assert_eq!(decision.evaluation_error, "role missing");
        assert!(decision.subjects.is_some());

        let resp: ResourceAccessReviewResponse =
            serde_json::from_str(r#"{"evaluationError":"also fine"}"#).unwrap();
        assert_eq!(AccessDecision::from(resp).evaluation_error, "also fine");
    }
}
