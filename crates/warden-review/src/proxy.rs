//! Browser-safe proxy probe
//!
//! Requests that carry no bearer token (cookies, anonymous) have the proxy
//! verb and the `pods/proxy` subresource rewritten to `unsafeproxy` before
//! authorization, so a browser cannot be tricked into proxying to a pod.
//! Token-bearing clients keep the original verb. Both are still refused
//! here since nobody has rights on the probed pod; what differs is the
//! reason in the refusal.

use kube::Client;
use tracing::debug;

use crate::error::ReviewError;

/// Legacy proxy verb path
pub const PROXY_VERB_PATH: &str = "/api/v1/proxy/namespaces/ns/pods/podX1:8080";

/// Proxy subresource path
pub const PROXY_SUBRESOURCE_PATH: &str = "/api/v1/namespaces/ns/pods/podX1:8080/proxy/appEndPoint";

const UNSAFE_PROXY_MESSAGES: &[&str] = &[
    r#"cannot proxy resource "pods" in API group "" in the namespace "ns": proxy verb changed to unsafeproxy"#,
    r#"cannot get resource "pods/proxy" in API group "" in the namespace "ns": proxy subresource changed to unsafeproxy"#,
];

/// One probe: a path and whether the refusal must be the unsafe-proxy one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyCase {
    /// Case name
    pub name: &'static str,
    /// Absolute API path
    pub path: &'static str,
    /// Whether the refusal must mention the unsafe-proxy rewrite
    pub expect_unsafe: bool,
}

/// Cases for a client holding an API token
pub fn token_cases() -> [ProxyCase; 2] {
    [
        ProxyCase {
            name: "safe to proxy verb",
            path: PROXY_VERB_PATH,
            expect_unsafe: false,
        },
        ProxyCase {
            name: "safe to proxy subresource",
            path: PROXY_SUBRESOURCE_PATH,
            expect_unsafe: false,
        },
    ]
}

/// Cases for a client without credentials
pub fn anonymous_cases() -> [ProxyCase; 2] {
    [
        ProxyCase {
            name: "unsafe to proxy verb",
            path: PROXY_VERB_PATH,
            expect_unsafe: true,
        },
        ProxyCase {
            name: "unsafe to proxy subresource",
            path: PROXY_SUBRESOURCE_PATH,
            expect_unsafe: true,
        },
    ]
}

/// True when the refusal is the unsafe-proxy rewrite
pub fn is_unsafe_proxy_error(err: &ReviewError) -> bool {
    let text = err.to_string();
    UNSAFE_PROXY_MESSAGES.iter().any(|m| text.contains(m))
}

/// Classify the outcome of a probe: it must be a 403 and its unsafe-ness
/// must equal `case.expect_unsafe`.
pub fn classify_proxy_response(
    case: &ProxyCase,
    outcome: &Result<(), ReviewError>,
) -> Result<(), String> {
    let (forbidden, unsafe_err, got) = match outcome {
        Ok(()) => (false, false, "success".to_string()),
        Err(err) => (err.is_forbidden(), is_unsafe_proxy_error(err), err.to_string()),
    };
    if forbidden && unsafe_err == case.expect_unsafe {
        return Ok(());
    }
    Err(format!(
        "{}: expected forbidden error on GET {}, got {:?} (isForbidden={}, expectUnsafe={}, actualUnsafe={})",
        case.name, case.path, got, forbidden, case.expect_unsafe, unsafe_err
    ))
}

/// Issue one GET against `path`
pub async fn probe(client: &Client, path: &str) -> Result<(), ReviewError> {
    let request = http::Request::get(path)
        .body(Vec::new())
        .map_err(|e| ReviewError::Transport(format!("invalid probe request: {}", e)))?;
    let body = client.request_text(request).await?;
    debug!(path = %path, bytes = body.len(), "Proxy probe answered");
    Ok(())
}

/// Probe `case.path` with `client` and classify the answer
pub async fn run_case(client: &Client, case: &ProxyCase) -> Result<(), String> {
    let outcome = probe(client, case.path).await;
    classify_proxy_response(case, &outcome)
}
