//! Human-readable renderings used in mismatch reasons

use std::fmt::Write;

use crate::decision::AccessDecision;
use crate::query::Action;

/// Scope text for a cluster-wide "who can" question
pub const ANY_NAMESPACE: &str = "(in any namespace)";

/// Scope text for a local "who can" question
pub const CURRENT_NAMESPACE: &str = "(in the current namespace)";

/// Render an action as a "who can" question.
///
/// `default_scope` is used when the action carries no namespace of its own.
pub fn describe_action(action: &Action, default_scope: &str) -> String {
    let scope = if action.namespace.is_empty() {
        default_scope.to_string()
    } else {
        format!("in namespace {:?}", action.namespace)
    };

    let resource = if action.group.is_empty() && action.version.is_empty() {
        action.resource.clone()
    } else if action.group.is_empty() {
        format!("{}/{}", action.resource, action.version)
    } else {
        format!("{}/{}/{}", action.resource, action.group, action.version)
    };

    if action.resource_name.is_empty() {
        format!("who can {} {} {}", action.verb, resource, scope)
    } else {
        format!(
            "who can {} the {} named {:?} {}",
            action.verb, resource, action.resource_name, scope
        )
    }
}

/// Render a "who can" answer as an indented block.
pub fn describe_resource_decision(decision: &AccessDecision) -> String {
    let mut out = if decision.namespace.is_empty() {
        "(in all namespaces)\n".to_string()
    } else {
        format!("(in the namespace {:?})\n", decision.namespace)
    };

    write_names(&mut out, "users", decision.users());
    write_names(&mut out, "groups", decision.groups());
    out
}

fn write_names<'a>(out: &mut String, label: &str, names: impl Iterator<Item = &'a str>) {
    let mut names = names.peekable();
    if names.peek().is_none() {
        return;
    }
    let _ = writeln!(out, "  {}:", label);
    for name in names {
        let _ = writeln!(out, "    - {}", name);
    }
}

/// Render a subject decision on one line.
pub fn describe_subject_decision(decision: &AccessDecision) -> String {
    let mut out = format!(
        "allowed={} namespace={:?} reason={:?}",
        decision.allowed, decision.namespace, decision.reason
    );
    if !decision.evaluation_error.is_empty() {
        let _ = write!(out, " evaluationError={:?}", decision.evaluation_error);
    }
    out
}
