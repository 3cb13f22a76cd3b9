//! Cluster connection shared by the e2e tests
//!
//! Uses the same lookup chain as the binary: `WARDEN_CONFIG` /
//! `~/.warden/config.yaml` for settings and `WARDEN_KUBECONFIG` (or kube's
//! defaults) for the admin identity.

use warden_cli::config;
use warden_cli::context::ClusterContext;
use warden_common::telemetry::{init_logging, LogFormat};

/// Initialize logging once; later calls are no-ops
pub fn init_e2e_test() {
    let _ = init_logging(LogFormat::Text);
}

/// Connect as the configured admin identity
pub async fn connect() -> Result<ClusterContext, String> {
    let config = config::load(None).map_err(|e| e.to_string())?;
    let kubeconfig = config::resolve_kubeconfig(None, &config);
    ClusterContext::connect(kubeconfig.as_deref(), &config)
        .await
        .map_err(|e| e.to_string())
}
