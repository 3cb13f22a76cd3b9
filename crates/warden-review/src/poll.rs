//! The eventually-consistent assertion poller
//!
//! Authorization decisions are served from a cache that catches up with new
//! role bindings asynchronously, so a single check right after a grant is
//! expected to flap. [`assert_eventually`] submits the review immediately and
//! then once per interval until the predicate accepts an outcome or the
//! timeout runs out. Every kind of review goes through this one loop; what
//! differs between them is only the predicate.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use warden_common::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};

/// Interval and bound for one assertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    /// Pause after a mismatched attempt before the next one is submitted
    pub interval: Duration,
    /// Maximum total wait
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollSettings {
    /// Settings with an explicit interval and timeout
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// An assertion that never matched within its window.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}\n{description}: timed out after {timeout:?} waiting for the condition ({attempts} attempts)")]
pub struct PollFailure {
    /// What was being asserted
    pub description: String,
    /// The most recent mismatch reason
    pub reason: String,
    /// Number of attempts made
    pub attempts: u32,
    /// The window that elapsed
    pub timeout: Duration,
}

impl PollFailure {
    /// The timeout error on its own, without the mismatch reason
    pub fn timeout_message(&self) -> String {
        format!(
            "{}: timed out after {:?} waiting for the condition",
            self.description, self.timeout
        )
    }

    /// Both failure lines: the last mismatch, then the timeout
    pub fn messages(&self) -> [String; 2] {
        [self.reason.clone(), self.timeout_message()]
    }
}

/// Poll `submit` until `compare` accepts its outcome.
///
/// `compare` returns `Ok(())` for a match or `Err(reason)` for a mismatch;
/// errors from `submit` are passed to `compare` as-is and count as
/// mismatches unless the predicate expects them. Returns on the first match
/// without waiting out the interval. On timeout the failure carries the last
/// mismatch reason.
pub async fn assert_eventually<T, E, F, Fut, C>(
    description: &str,
    settings: &PollSettings,
    mut submit: F,
    mut compare: C,
) -> Result<(), PollFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: FnMut(Result<T, E>) -> Result<(), String>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        let reason = match compare(submit().await) {
            Ok(()) => {
                debug!(
                    assertion = %description,
                    attempts = attempts,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Assertion satisfied"
                );
                return Ok(());
            }
            Err(reason) => reason,
        };

        let elapsed = start.elapsed();
        if elapsed >= settings.timeout {
            warn!(
                assertion = %description,
                attempts = attempts,
                timeout_ms = settings.timeout.as_millis(),
                "Assertion did not converge"
            );
            return Err(PollFailure {
                description: description.to_string(),
                reason,
                attempts,
                timeout: settings.timeout,
            });
        }

        trace!(
            assertion = %description,
            attempt = attempts,
            reason = %reason,
            "Mismatch, polling again"
        );
        tokio::time::sleep(settings.interval.min(settings.timeout - elapsed)).await;
    }
}
