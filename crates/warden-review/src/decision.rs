//! Access decisions returned by a review surface

use std::collections::BTreeSet;

/// Users and groups found to match a "who can" review.
///
/// Stored as ordered sets so that comparison ignores ordering and
/// duplicates, which the apiserver does not promise to avoid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubjectSets {
    /// Matching user names
    pub users: BTreeSet<String>,
    /// Matching group names
    pub groups: BTreeSet<String>,
}

impl SubjectSets {
    /// Build from any lists of names
    pub fn new<U, G, S, T>(users: U, groups: G) -> Self
    where
        U: IntoIterator<Item = S>,
        G: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of one access review.
///
/// Subject reviews fill `allowed` and `reason`; resource ("who can")
/// reviews fill `subjects`. Both report the namespace they were evaluated
/// in and any evaluation error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the action is permitted
    pub allowed: bool,
    /// Human-readable justification; compared by prefix
    pub reason: String,
    /// Non-fatal error hit while evaluating rules
    pub evaluation_error: String,
    /// Namespace the decision applies to; empty for cluster scope
    pub namespace: String,
    /// Matching principals, for resource access reviews only
    pub subjects: Option<SubjectSets>,
}

impl AccessDecision {
    /// An allowed subject decision
    pub fn allowed(namespace: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// A denied subject decision with no reason, the shape the apiserver
    /// returns whether or not the namespace exists
    pub fn denied(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// A resource decision listing who may act
    pub fn who_can(namespace: impl Into<String>, subjects: SubjectSets) -> Self {
        Self {
            namespace: namespace.into(),
            subjects: Some(subjects),
            ..Default::default()
        }
    }

    /// Matching users, empty for subject decisions
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.subjects
            .iter()
            .flat_map(|s| s.users.iter().map(String::as_str))
    }

    /// Matching groups, empty for subject decisions
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.subjects
            .iter()
            .flat_map(|s| s.groups.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_sets_ignore_order_and_duplicates() {
        let a = SubjectSets::new(["mark", "edgar", "mark"], ["system:masters"]);
        let b = SubjectSets::new(["edgar", "mark"], ["system:masters", "system:masters"]);
        assert_eq!(a, b);
        assert_eq!(a.users.len(), 2);
    }

    #[test]
    fn denied_decision_has_no_reason() {
        let d = AccessDecision::denied("nonexistent-project");
        assert!(!d.allowed);
        assert!(d.reason.is_empty());
        assert_eq!(d.namespace, "nonexistent-project");
        assert!(d.subjects.is_none());
    }

    #[test]
    fn who_can_exposes_sorted_names() {
        let d = AccessDecision::who_can(
            "hammer",
            SubjectSets::new(["valerie", "harold"], Vec::<String>::new()),
        );
        assert_eq!(d.users().collect::<Vec<_>>(), vec!["harold", "valerie"]);
        assert_eq!(d.groups().count(), 0);
        assert_eq!(AccessDecision::allowed("", "RBAC").users().count(), 0);
    }
}
