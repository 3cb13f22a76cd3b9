//! Access review model, surfaces and the eventually-consistent poller
//!
//! Authorization state on a live cluster converges asynchronously after a
//! role binding changes. Everything here is built around asking the same
//! question repeatedly until the answer settles:
//!
//! - [`query`] and [`decision`] model the question and the answer
//! - [`reviewer`] submits questions to the project or kube authorization API
//! - [`expectation`] decides whether one answer is the expected one
//! - [`poll`] repeats a submission until it matches or times out
//! - [`cross_check`] runs one case through both APIs and requires agreement
//! - [`report`] collects failures so a suite runs to completion

#![deny(missing_docs)]

pub mod baseline;
pub mod coverage;
pub mod cross_check;
pub mod decision;
pub mod error;
pub mod expectation;
pub mod poll;
pub mod pretty;
pub mod proxy;
pub mod query;
pub mod report;
pub mod reviewer;

pub use baseline::BaselineReaders;
pub use cross_check::{ResourceReviewCase, ReviewSurfaces, SubjectReviewCase};
pub use decision::{AccessDecision, SubjectSets};
pub use error::ReviewError;
pub use expectation::{ErrorMatch, Expectation};
pub use poll::{assert_eventually, PollFailure, PollSettings};
pub use query::{AccessQuery, Action, ReviewKind, ReviewScope};
pub use report::ScenarioReport;
pub use reviewer::{AccessReviewer, KubeReviewer, ProjectReviewer};
