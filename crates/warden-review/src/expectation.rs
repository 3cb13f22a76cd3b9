//! What a poll attempt is compared against

use crate::decision::AccessDecision;
use crate::error::ReviewError;
use crate::pretty::{describe_action, describe_resource_decision, describe_subject_decision};
use crate::query::Action;

/// How an expected error is matched against the actual error text.
///
/// The two modes guard different things and are not interchangeable:
/// `Contains` only checks that the request was refused, `Prefix` pins the
/// exact leading message format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorMatch {
    /// Actual error text must contain this substring
    Contains(String),
    /// Actual error text must start with this text
    Prefix(String),
}

impl ErrorMatch {
    /// Expected text
    pub fn text(&self) -> &str {
        match self {
            ErrorMatch::Contains(s) | ErrorMatch::Prefix(s) => s,
        }
    }

    /// Whether `actual` satisfies this matcher
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            ErrorMatch::Contains(s) => actual.contains(s.as_str()),
            ErrorMatch::Prefix(s) => actual.starts_with(s.as_str()),
        }
    }
}

/// Expected outcome of an access review.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expectation {
    /// Scenario description, prefixed to every mismatch reason
    pub description: String,
    /// Expected decision, compared when no error is expected
    pub decision: AccessDecision,
    /// Expected error; when set, any non-matching outcome is a mismatch
    pub error: Option<ErrorMatch>,
    /// The action under review, used to render list-style mismatches
    pub action: Option<Action>,
    /// Scope text for `action` when it carries no namespace
    pub default_scope: &'static str,
}

impl Expectation {
    /// Expect a decision
    pub fn decision(description: impl Into<String>, decision: AccessDecision) -> Self {
        Self {
            description: description.into(),
            decision,
            error: None,
            action: None,
            default_scope: crate::pretty::ANY_NAMESPACE,
        }
    }

    /// Expect an error
    pub fn error(description: impl Into<String>, error: ErrorMatch) -> Self {
        Self {
            description: description.into(),
            decision: AccessDecision::default(),
            error: Some(error),
            action: None,
            default_scope: crate::pretty::ANY_NAMESPACE,
        }
    }

    /// Attach the action so list-style mismatches read as a question
    pub fn for_action(mut self, action: Action, default_scope: &'static str) -> Self {
        self.action = Some(action);
        self.default_scope = default_scope;
        self
    }

    /// Classify one attempt: `Ok(())` on match, otherwise the reason.
    pub fn check(&self, actual: Result<AccessDecision, ReviewError>) -> Result<(), String> {
        let d = &self.description;

        let actual = match (&self.error, actual) {
            (Some(expected), Ok(_)) => {
                return Err(format!("{}: expected error: {}", d, expected.text()));
            }
            (Some(expected), Err(err)) => {
                let text = err.to_string();
                if expected.matches(&text) {
                    return Ok(());
                }
                return Err(format!(
                    "{}: expected\n\t{}\ngot\n\t{}",
                    d,
                    expected.text(),
                    text
                ));
            }
            (None, Err(err)) => return Err(format!("{}: unexpected error: {}", d, err)),
            (None, Ok(actual)) => actual,
        };

        let want = &self.decision;
        if actual.namespace != want.namespace {
            return Err(format!(
                "{}: namespace does not match ({:?} != {:?})",
                d, actual.namespace, want.namespace
            ));
        }
        if actual.evaluation_error != want.evaluation_error {
            return Err(format!(
                "{}: evaluation error does not match ({:?} != {:?})",
                d, actual.evaluation_error, want.evaluation_error
            ));
        }

        if actual.allowed != want.allowed || !actual.reason.starts_with(&want.reason) {
            return Err(format!(
                "{}:\n\texpected {}\n\tgot      {}",
                d,
                describe_subject_decision(want),
                describe_subject_decision(&actual)
            ));
        }

        // Only "who can" expectations carry subjects; subject reviews never
        // return any, so there is nothing to compare for them.
        if let Some(want_subjects) = &want.subjects {
            let got = actual.subjects.clone().unwrap_or_default();
            if &got != want_subjects {
                return Err(self.list_mismatch(&actual));
            }
        }

        Ok(())
    }

    fn list_mismatch(&self, actual: &AccessDecision) -> String {
        let question = self
            .action
            .as_ref()
            .map(|a| describe_action(a, self.default_scope))
            .unwrap_or_else(|| "who can".to_string());
        format!(
            "{}:\n  {}:\n  expected {}\n  got {}",
            self.description,
            question,
            describe_resource_decision(&self.decision),
            describe_resource_decision(actual)
        )
    }
}
