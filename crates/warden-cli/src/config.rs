//! Warden configuration stored at `~/.warden/config.yaml`.
//!
//! The config file lookup (highest priority first):
//! 1. Explicit `--config` flag
//! 2. `WARDEN_CONFIG` environment variable
//! 3. `~/.warden/config.yaml`
//! 4. Built-in defaults
//!
//! The kubeconfig resolution chain (highest priority first):
//! 1. Explicit `--kubeconfig` flag
//! 2. `WARDEN_KUBECONFIG` environment variable
//! 3. `kubeconfig` in the config file
//! 4. Fall back to kube default (`KUBECONFIG` env / `~/.kube/config` / in-cluster)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_review::{BaselineReaders, PollSettings};

use crate::{Error, Result};

const CONFIG_DIR_NAME: &str = ".warden";
const CONFIG_FILE_NAME: &str = "config.yaml";
const WARDEN_CONFIG_ENV: &str = "WARDEN_CONFIG";
const WARDEN_KUBECONFIG_ENV: &str = "WARDEN_KUBECONFIG";

/// Poll cadence for every assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Milliseconds between attempts
    pub interval_ms: u64,
    /// Seconds before an assertion gives up
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            timeout_secs: 10,
        }
    }
}

impl PollConfig {
    /// Poller settings for these durations
    pub fn settings(&self) -> PollSettings {
        PollSettings::new(
            Duration::from_millis(self.interval_ms),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

/// Persistent suite configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Kubeconfig for the admin identity
    pub kubeconfig: Option<PathBuf>,
    /// Poll cadence
    pub poll: PollConfig,
    /// Whether the cluster serves `authorization.openshift.io`
    pub openshift_api: bool,
    /// Principals every "who can read" answer includes
    pub baseline_readers: BaselineReaders,
    /// Whether suites may impersonate users
    pub impersonation: bool,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            poll: PollConfig::default(),
            openshift_api: true,
            baseline_readers: BaselineReaders::openshift_defaults(),
            impersonation: true,
        }
    }
}

impl WardenConfig {
    /// Parse YAML, filling anything missing from the defaults
    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(data)?;
        if config.poll.interval_ms == 0 {
            return Err(Error::validation("poll.interval_ms must be greater than zero"));
        }
        Ok(config)
    }

    /// Read and parse one file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }
}

/// Path to `~/.warden/config.yaml`, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration using the lookup chain.
///
/// An explicit or env-provided file must exist; the home file is optional.
pub fn load(explicit: Option<&Path>) -> Result<WardenConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "Loading config from --config");
        return WardenConfig::from_file(path);
    }

    if let Ok(path) = std::env::var(WARDEN_CONFIG_ENV) {
        if !path.is_empty() {
            debug!(path = %path, "Loading config from {}", WARDEN_CONFIG_ENV);
            return WardenConfig::from_file(Path::new(&path));
        }
    }

    if let Some(path) = default_config_path() {
        if path.exists() {
            debug!(path = %path.display(), "Loading config from home directory");
            return WardenConfig::from_file(&path);
        }
    }

    Ok(WardenConfig::default())
}

/// Resolve a kubeconfig path using the priority chain.
///
/// Returns `None` to use kube's own inference.
pub fn resolve_kubeconfig(explicit: Option<&Path>, config: &WardenConfig) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(WARDEN_KUBECONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    config.kubeconfig.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = WardenConfig::from_yaml("").unwrap();
        assert_eq!(config, WardenConfig::default());
        assert!(config.openshift_api);
        assert!(config.impersonation);
        assert!(config.baseline_readers.groups.contains("system:cluster-readers"));
        assert_eq!(config.poll.settings(), PollSettings::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = WardenConfig::from_yaml(
            r#"
openshift_api: false
poll:
  timeout_secs: 30
baseline_readers:
  groups: [system:masters]
"#,
        )
        .unwrap();
        assert!(!config.openshift_api);
        assert_eq!(config.poll.interval_ms, 100);
        assert_eq!(config.poll.settings().timeout, Duration::from_secs(30));
        assert!(config.baseline_readers.users.is_empty());
        assert_eq!(config.baseline_readers.groups.len(), 1);
        assert!(config.impersonation);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = WardenConfig::from_yaml("poll:\n  interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = WardenConfig::from_yaml("poll: [not, a, map]").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn explicit_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "kubeconfig: /etc/warden/admin.kubeconfig").unwrap();
        let config = load(Some(file.path())).unwrap();
        assert_eq!(
            config.kubeconfig.as_deref(),
            Some(Path::new("/etc/warden/admin.kubeconfig"))
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let err = load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn resolve_kubeconfig_explicit_wins() {
        let config = WardenConfig {
            kubeconfig: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };
        let result = resolve_kubeconfig(Some(Path::new("/explicit/path")), &config);
        assert_eq!(result.as_deref(), Some(Path::new("/explicit/path")));
    }
}
