//! Kubernetes client construction for the identities a suite acts as
//!
//! Every scenario talks to the same apiserver as several principals: the
//! configured (usually cluster-admin) identity, ordinary users reached by
//! impersonation, and the anonymous user. All of them are derived from one
//! loaded `kube::Config` so the cluster URL and CA are shared.

use std::path::Path;
use std::time::Duration;

use kube::config::{AuthInfo, KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::retry::{retry_with_backoff_if, RetryConfig};
use crate::Error;

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Who a client authenticates as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    /// Whatever the kubeconfig's current context authenticates as
    Configured,
    /// The configured identity impersonating a user (and optional groups)
    User {
        /// Username to impersonate
        name: String,
        /// Extra groups to impersonate
        groups: Vec<String>,
    },
    /// No credentials at all; the apiserver maps this to `system:anonymous`
    Anonymous,
}

impl Identity {
    /// Impersonate a user with no extra groups
    pub fn user(name: impl Into<String>) -> Self {
        Identity::User {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &str {
        match self {
            Identity::Configured => "configured",
            Identity::User { name, .. } => name,
            Identity::Anonymous => crate::ANONYMOUS_USER,
        }
    }
}

/// Load a client config from an optional kubeconfig path with default timeouts
///
/// `None` falls back to kube's inference (`KUBECONFIG`, `~/.kube/config`,
/// in-cluster service account).
pub async fn load_config(kubeconfig: Option<&Path>) -> Result<Config, Error> {
    load_config_with_timeout(kubeconfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT).await
}

/// Load a client config from an optional kubeconfig path with custom timeouts
pub async fn load_config_with_timeout(
    kubeconfig: Option<&Path>,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Config, Error> {
    let mut config = match kubeconfig {
        Some(path) => {
            let context = path.display().to_string();
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::config_with_context(&context, format!("failed to read kubeconfig: {}", e))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    Error::config_with_context(
                        &context,
                        format!("failed to load kubeconfig: {}", e),
                    )
                })?
        }
        None => Config::infer().await.map_err(|e| {
            Error::config_with_context("infer", format!("failed to infer config: {}", e))
        })?,
    };
    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);
    Ok(config)
}

/// Rewrite a config so requests authenticate as `identity`.
pub fn apply_identity(config: &mut Config, identity: &Identity) {
    match identity {
        Identity::Configured => {}
        Identity::User { name, groups } => {
            config.auth_info.impersonate = Some(name.clone());
            config.auth_info.impersonate_groups = if groups.is_empty() {
                None
            } else {
                Some(groups.clone())
            };
        }
        Identity::Anonymous => {
            // Dropping the whole auth section strips tokens, client certs
            // and exec plugins alike.
            config.auth_info = AuthInfo::default();
        }
    }
}

/// Build a client for `identity` from an already loaded config.
pub fn client_for(config: &Config, identity: &Identity) -> Result<Client, Error> {
    let mut config = config.clone();
    apply_identity(&mut config, identity);
    debug!(identity = %identity.label(), cluster = %config.cluster_url, "Building kube client");
    Client::try_from(config).map_err(|e| {
        Error::internal_with_context(
            "client_for",
            format!("failed to create client for {}: {}", identity.label(), e),
        )
    })
}

/// Load the kubeconfig, retrying transient failures (exec plugins and token
/// files can flap). A kubeconfig that cannot be read or parsed fails at once.
pub async fn load_config_with_retry(kubeconfig: Option<&Path>) -> Result<Config, Error> {
    retry_with_backoff_if(
        &RetryConfig::with_max_attempts(5),
        "load_kubeconfig",
        || load_config(kubeconfig),
        Error::is_retryable,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        let mut config = Config::new("https://127.0.0.1:6443".parse().expect("valid uri"));
        config.auth_info.client_certificate_data = Some("YWRtaW4tY2VydA==".to_string());
        config
    }

    #[test]
    fn configured_identity_leaves_credentials_alone() {
        let mut config = base_config();
        apply_identity(&mut config, &Identity::Configured);
        assert!(config.auth_info.client_certificate_data.is_some());
        assert!(config.auth_info.impersonate.is_none());
    }

    #[test]
    fn user_identity_impersonates_on_top_of_admin_credentials() {
        let mut config = base_config();
        apply_identity(
            &mut config,
            &Identity::User {
                name: "harold-x1".to_string(),
                groups: vec!["system:authenticated".to_string()],
            },
        );
        assert!(config.auth_info.client_certificate_data.is_some());
        assert_eq!(config.auth_info.impersonate.as_deref(), Some("harold-x1"));
        assert_eq!(
            config.auth_info.impersonate_groups,
            Some(vec!["system:authenticated".to_string()])
        );
    }

    #[test]
    fn user_identity_without_groups_sends_no_group_header() {
        let mut config = base_config();
        apply_identity(&mut config, &Identity::user("valerie-x1"));
        assert!(config.auth_info.impersonate_groups.is_none());
    }

    #[test]
    fn anonymous_identity_strips_every_credential() {
        let mut config = base_config();
        config.auth_info.impersonate = Some("someone".to_string());
        apply_identity(&mut config, &Identity::Anonymous);
        assert!(config.auth_info.client_certificate_data.is_none());
        assert!(config.auth_info.impersonate.is_none());
        assert_eq!(config.cluster_url.host(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn missing_kubeconfig_fails_without_retrying() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent-kubeconfig");

        let start = std::time::Instant::now();
        let err = load_config_with_retry(Some(&path))
            .await
            .expect_err("absent kubeconfig must not load");

        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(err.context(), Some(path.display().to_string().as_str()));
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[test]
    fn identity_labels() {
        assert_eq!(Identity::Configured.label(), "configured");
        assert_eq!(Identity::user("mark").label(), "mark");
        assert_eq!(Identity::Anonymous.label(), "system:anonymous");
    }
}
