//! Review surfaces
//!
//! The same logical question can be put to the cluster through two API
//! groups. [`ProjectReviewer`] speaks `authorization.openshift.io/v1` and
//! serves both review kinds; [`KubeReviewer`] speaks `authorization.k8s.io/v1`
//! and serves subject reviews only. Both sit behind [`AccessReviewer`] so the
//! poller and the cross-check never care which one they hold.

mod kube_api;
mod project;

pub use kube_api::KubeReviewer;
pub use project::ProjectReviewer;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::decision::AccessDecision;
use crate::error::ReviewError;
use crate::query::{AccessQuery, ReviewKind, ReviewScope};

/// One API surface that can answer access reviews.
///
/// Each implementation is bound to a single identity; submitting the same
/// query as a different user means using a different reviewer.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccessReviewer: Send + Sync {
    /// Short surface name used in messages
    fn surface(&self) -> &'static str;

    /// Submit a cluster-scoped review
    async fn create_access_review(
        &self,
        kind: ReviewKind,
        query: &AccessQuery,
    ) -> Result<AccessDecision, ReviewError>;

    /// Submit a review evaluated within `namespace`
    async fn create_local_access_review(
        &self,
        kind: ReviewKind,
        namespace: &str,
        query: &AccessQuery,
    ) -> Result<AccessDecision, ReviewError>;
}

/// Submit `query` at `scope`, dispatching to the matching trait method
pub async fn submit(
    reviewer: &dyn AccessReviewer,
    kind: ReviewKind,
    scope: &ReviewScope,
    query: &AccessQuery,
) -> Result<AccessDecision, ReviewError> {
    match scope {
        ReviewScope::Cluster => reviewer.create_access_review(kind, query).await,
        ReviewScope::Local(namespace) => {
            reviewer
                .create_local_access_review(kind, namespace, query)
                .await
        }
    }
}
