//! CLI commands

use std::fmt::Display;

use warden_review::ScenarioReport;

use crate::{Error, Result};

pub mod check;
pub mod coverage;
pub mod suite;

/// Extension trait to convert errors with Display to CLI Error::CommandFailed.
///
/// This reduces boilerplate for the common pattern of `.map_err(|e| Error::command_failed(e.to_string()))`.
pub trait CommandErrorExt<T> {
    /// Convert an error to `Error::CommandFailed` using its Display implementation.
    fn cmd_err(self) -> Result<T>;
}

impl<T, E: Display> CommandErrorExt<T> for std::result::Result<T, E> {
    fn cmd_err(self) -> Result<T> {
        self.map_err(|e| Error::command_failed(e.to_string()))
    }
}

/// Close out a report, turning failed steps into `Error::SuiteFailed`
pub fn finish_report(report: &ScenarioReport) -> Result<()> {
    report.finish().map_err(Error::suite_failed)
}
