//! Connection to the cluster under test
//!
//! One kubeconfig is loaded once; every identity a suite acts as is derived
//! from it, so all clients share the cluster URL and CA.

use std::path::Path;
use std::sync::Arc;

use kube::{Client, Config};
use tracing::info;
use warden_common::kube_utils::{client_for, load_config_with_retry, Identity};
use warden_common::ANONYMOUS_USER;
use warden_review::{
    AccessReviewer, BaselineReaders, KubeReviewer, PollSettings, ProjectReviewer, ReviewSurfaces,
};

use crate::config::WardenConfig;
use crate::{Error, Result};

/// Map a user name to the identity that acts as it
pub fn identity_for(user: &str) -> Identity {
    if user == ANONYMOUS_USER {
        Identity::Anonymous
    } else {
        Identity::user(user)
    }
}

/// Everything a command needs to talk to the cluster.
pub struct ClusterContext {
    base: Config,
    admin: Client,
    /// Poll cadence for assertions
    pub settings: PollSettings,
    /// Whether `authorization.openshift.io` is served
    pub openshift_api: bool,
    /// Principals added to every "who can read" expectation
    pub baseline: BaselineReaders,
    impersonation: bool,
}

impl ClusterContext {
    /// Load the kubeconfig (retrying flaky exec plugins) and build the admin client
    pub async fn connect(kubeconfig: Option<&Path>, config: &WardenConfig) -> Result<Self> {
        let base = load_config_with_retry(kubeconfig).await?;
        let admin = client_for(&base, &Identity::Configured)?;
        info!(
            cluster = %base.cluster_url,
            openshift_api = config.openshift_api,
            "Connected to cluster"
        );
        Ok(Self {
            base,
            admin,
            settings: config.poll.settings(),
            openshift_api: config.openshift_api,
            baseline: config.baseline_readers.clone(),
            impersonation: config.impersonation,
        })
    }

    /// Client for the configured identity
    pub fn admin(&self) -> &Client {
        &self.admin
    }

    /// Client acting as `identity`
    pub fn client(&self, identity: &Identity) -> Result<Client> {
        match identity {
            Identity::Configured => Ok(self.admin.clone()),
            Identity::User { name, .. } if !self.impersonation => Err(Error::validation(format!(
                "acting as {} needs impersonation, which is disabled in configuration",
                name
            ))),
            _ => Ok(client_for(&self.base, identity)?),
        }
    }

    /// Review surfaces acting as `identity`; the project surface is absent
    /// when the cluster does not serve it
    pub fn surfaces(&self, identity: &Identity) -> Result<ReviewSurfaces> {
        let client = self.client(identity)?;
        let kube: Arc<dyn AccessReviewer> = Arc::new(KubeReviewer::new(client.clone()));
        let surfaces = ReviewSurfaces::new(Arc::new(ProjectReviewer::new(client)), kube);
        Ok(if self.openshift_api {
            surfaces
        } else {
            surfaces.kube_only()
        })
    }

    /// The project surface alone, for "who can" reviews
    pub fn project_reviewer(&self, identity: &Identity) -> Result<ProjectReviewer> {
        if !self.openshift_api {
            return Err(Error::validation(
                "resource access reviews need the project authorization API (openshift_api: false)",
            ));
        }
        Ok(ProjectReviewer::new(self.client(identity)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_reports_an_unreadable_kubeconfig_by_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("kubeconfig");

        match ClusterContext::connect(Some(&path), &WardenConfig::default()).await {
            Err(Error::Common(warden_common::Error::Config { context, .. })) => {
                assert_eq!(context, path.display().to_string());
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("connected without a kubeconfig"),
        }
    }

    #[test]
    fn anonymous_user_maps_to_anonymous_identity() {
        assert_eq!(identity_for("system:anonymous"), Identity::Anonymous);
        assert_eq!(identity_for("harold-x1"), Identity::user("harold-x1"));
    }
}
