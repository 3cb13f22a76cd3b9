//! Non-fatal failure collection for scenario suites
//!
//! A failed assertion is recorded and the suite moves on, so one run reports
//! every broken guarantee instead of stopping at the first.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{error, info};

use crate::poll::PollFailure;

/// Outcome of one named step.
#[derive(Clone, Debug)]
pub struct StepResult {
    /// Step name
    pub name: String,
    /// Failure messages recorded during the step, in order
    pub failures: Vec<String>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl StepResult {
    /// True when nothing was recorded against the step
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Collects step results for one suite. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ScenarioReport {
    suite: String,
    steps: Arc<Mutex<Vec<StepResult>>>,
    current: Arc<Mutex<Vec<String>>>,
}

impl ScenarioReport {
    /// Start an empty report for `suite`
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            steps: Arc::new(Mutex::new(Vec::new())),
            current: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Suite name
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Record a failure against the step in progress
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!(suite = %self.suite, "{}", message);
        self.current.lock().push(message);
    }

    /// Record both lines of a poll failure
    pub fn poll_failure(&self, failure: &PollFailure) {
        for message in failure.messages() {
            self.error(message);
        }
    }

    /// Record a poll outcome: nothing on success, both lines on failure
    pub fn record_poll(&self, outcome: Result<(), PollFailure>) {
        if let Err(failure) = outcome {
            self.poll_failure(&failure);
        }
    }

    /// Run one step. Failures recorded through [`ScenarioReport::error`]
    /// while it runs, an `Err` it returns, and a panic are attributed to it.
    pub async fn step<F, Fut>(&self, name: &str, f: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        info!(suite = %self.suite, step = %name, "Running step");
        let start = Instant::now();
        match AssertUnwindSafe(f()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.error(format!("{}: {}", name, e)),
            Err(panic) => {
                let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                self.error(format!("{}: PANIC: {}", name, msg));
            }
        }
        let failures = std::mem::take(&mut *self.current.lock());
        self.steps.lock().push(StepResult {
            name: name.to_string(),
            failures,
            duration: start.elapsed(),
        });
    }

    /// Snapshot of finished steps
    pub fn results(&self) -> Vec<StepResult> {
        self.steps.lock().clone()
    }

    /// Log a PASS/FAIL summary and return an error naming failed steps.
    ///
    /// Failures recorded outside any step count as an extra "setup" step.
    pub fn finish(&self) -> Result<(), String> {
        let stray = std::mem::take(&mut *self.current.lock());
        if !stray.is_empty() {
            self.steps.lock().push(StepResult {
                name: "setup".to_string(),
                failures: stray,
                duration: Duration::ZERO,
            });
        }

        let steps = self.steps.lock();
        let total: Duration = steps.iter().map(|s| s.duration).sum();
        let failed: Vec<&str> = steps
            .iter()
            .filter(|s| !s.passed())
            .map(|s| s.name.as_str())
            .collect();

        info!("========================================");
        info!("  {}", self.suite.to_uppercase());
        info!("========================================");
        for s in steps.iter() {
            let tag = if s.passed() { "PASS" } else { "FAIL" };
            info!("  {tag}  {:60} {:.1}s", s.name, s.duration.as_secs_f64());
            for f in &s.failures {
                let first_line = f.lines().next().unwrap_or_default();
                info!("        -> {first_line}");
            }
        }
        info!("----------------------------------------");
        info!(
            "  {} passed, {} failed ({:.1}s total)",
            steps.len() - failed.len(),
            failed.len(),
            total.as_secs_f64()
        );

        if failed.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "{} step(s) failed in {}: {}",
                failed.len(),
                self.suite,
                failed.join(", ")
            ))
        }
    }
}
