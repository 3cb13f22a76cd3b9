//! End-to-end tests against a live cluster
//!
//! Every test here provisions projects and grants on the cluster the
//! kubeconfig points at, so they are behind the `cluster-e2e` feature and
//! ignored by default. The kubeconfig must authenticate as a cluster admin
//! that may impersonate users.
//!
//! # Running Tests
//!
//! ```bash
//! WARDEN_KUBECONFIG=/path/to/admin.kubeconfig \
//! cargo test --features cluster-e2e --test e2e -- --ignored --nocapture
//! ```
//!
//! A single suite:
//!
//! ```bash
//! cargo test --features cluster-e2e --test e2e test_api_group_suite -- --ignored --nocapture
//! ```

#[cfg(feature = "cluster-e2e")]
mod context;

mod check_e2e;
mod coverage_e2e;
mod suites_e2e;
