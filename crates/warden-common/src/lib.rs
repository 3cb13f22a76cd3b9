//! Common types for Warden: errors, retry, kube clients and logging

#![deny(missing_docs)]

pub mod error;
pub mod kube_utils;
pub mod retry;
pub mod telemetry;

use std::time::Duration;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default interval between access review poll attempts
///
/// Matches the refresh cadence of the apiserver's policy cache closely enough
/// that a freshly created binding is usually observed within a few attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default upper bound on how long an access review may lag a permission change
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// Field manager used for server-side apply and as the binding creator
pub const FIELD_MANAGER: &str = "warden";

/// Username the apiserver assigns to unauthenticated requests
pub const ANONYMOUS_USER: &str = "system:anonymous";

/// Label put on every object Warden creates so leftovers can be swept
pub const LABEL_CREATED_BY: &str = "warden.dev/created-by";
