//! Access queries: who is asking to do what, where

use serde::{Deserialize, Serialize};

/// The operation an access review asks about.
///
/// Field names follow the `authorization.openshift.io/v1` wire format, which
/// the project surface serializes directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Namespace the action targets; empty means "the review's scope"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Verb, e.g. `get`, `create`, `delete`
    pub verb: String,
    /// API group of the resource; empty is the core group
    #[serde(rename = "resourceAPIGroup", default)]
    pub group: String,
    /// API version of the resource; empty means any
    #[serde(rename = "resourceAPIVersion", default)]
    pub version: String,
    /// Resource type, e.g. `pods`, `deploymentconfigs`
    pub resource: String,
    /// Name of a single object, empty for the whole collection
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_name: String,
}

impl Action {
    /// Action on a core-group resource
    pub fn new(verb: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            resource: resource.into(),
            ..Default::default()
        }
    }

    /// Set the API group
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set the API version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Narrow the action to one named object
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.resource_name = name.into();
        self
    }

    /// Pin the action to a namespace
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// A principal plus an action. An empty principal means "the caller".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessQuery {
    /// User to evaluate for; empty when asking about the caller
    pub user: String,
    /// Groups to evaluate for
    pub groups: Vec<String>,
    /// What is being asked about
    pub action: Action,
}

impl AccessQuery {
    /// "Can I ...?" for the calling identity
    pub fn for_caller(action: Action) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    /// "Can `user` ...?"
    pub fn for_user(user: impl Into<String>, action: Action) -> Self {
        Self {
            user: user.into(),
            action,
            ..Default::default()
        }
    }

    /// "Can members of `groups` ...?"
    pub fn for_groups<I, S>(groups: I, action: Action) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            groups: groups.into_iter().map(Into::into).collect(),
            action,
            ..Default::default()
        }
    }

    /// True when no principal is named and the caller is evaluated
    pub fn is_self(&self) -> bool {
        self.user.is_empty() && self.groups.is_empty()
    }
}

/// Whether a review asks "can P do A?" or "who can do A?".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewKind {
    /// Subject access review: a single allow/deny decision
    Subject,
    /// Resource access review: the users and groups that may act
    Resource,
}

impl ReviewKind {
    /// Plural resource name of the cluster-scoped review object
    pub fn cluster_resource(self) -> &'static str {
        match self {
            ReviewKind::Subject => "subjectaccessreviews",
            ReviewKind::Resource => "resourceaccessreviews",
        }
    }

    /// Plural resource name of the namespaced review object
    pub fn local_resource(self) -> &'static str {
        match self {
            ReviewKind::Subject => "localsubjectaccessreviews",
            ReviewKind::Resource => "localresourceaccessreviews",
        }
    }
}

/// Where a review is evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewScope {
    /// Cluster-wide; needs elevated privilege to submit
    Cluster,
    /// Within one namespace
    Local(String),
}

impl ReviewScope {
    /// Namespace of a local scope
    pub fn namespace(&self) -> Option<&str> {
        match self {
            ReviewScope::Cluster => None,
            ReviewScope::Local(ns) => Some(ns),
        }
    }
}
