//! Cluster-reader coverage analysis
//!
//! Compares what the `cluster-reader` role grants against what the server
//! serves. A reader must cover every readable resource and must not cover
//! anything that escalates privilege (secrets, tokens, exec, proxies).

use std::collections::BTreeSet;
use std::fmt;

use k8s_openapi::api::rbac::v1::PolicyRule;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;

const OAUTH: &str = "oauth.openshift.io";
const IMAGE: &str = "image.openshift.io";
const BUILD: &str = "build.openshift.io";
const APPS_OPENSHIFT: &str = "apps.openshift.io";

/// A resource (or `resource/subresource`) within an API group.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupResource {
    /// API group, empty for core
    pub group: String,
    /// Resource name as served by discovery
    pub resource: String,
}

impl GroupResource {
    /// Build from a group and resource
    pub fn new(group: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            resource: resource.into(),
        }
    }

    /// A resource in the core group
    pub fn core(resource: impl Into<String>) -> Self {
        Self::new("", resource)
    }
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

fn set(pairs: &[(&str, &str)]) -> BTreeSet<GroupResource> {
    pairs.iter().map(|(g, r)| GroupResource::new(*g, *r)).collect()
}

/// Resources a reader must never be granted
pub fn escalating_resources() -> BTreeSet<GroupResource> {
    set(&[
        (OAUTH, "oauthauthorizetokens"),
        (OAUTH, "oauthaccesstokens"),
        (OAUTH, "oauthclients"),
        (IMAGE, "imagestreams/secrets"),
        ("", "secrets"),
        ("", "pods/exec"),
        ("", "pods/proxy"),
        ("", "pods/portforward"),
        ("", "nodes/proxy"),
        ("", "services/proxy"),
        ("", "oauthauthorizetokens"),
        ("", "oauthaccesstokens"),
        ("", "oauthclients"),
        ("", "imagestreams/secrets"),
    ])
}

/// Resources with no read API, which a reader need not cover
pub fn non_reading_resources() -> BTreeSet<GroupResource> {
    set(&[
        (APPS_OPENSHIFT, "deploymentconfigrollbacks"),
        (APPS_OPENSHIFT, "generatedeploymentconfigs"),
        (APPS_OPENSHIFT, "deploymentconfigs/rollback"),
        (APPS_OPENSHIFT, "deploymentconfigs/instantiate"),
        (BUILD, "buildconfigs/instantiatebinary"),
        (BUILD, "buildconfigs/instantiate"),
        (BUILD, "builds/clone"),
        (IMAGE, "imagestreamimports"),
        (IMAGE, "imagestreammappings"),
        ("extensions", "deployments/rollback"),
        ("apps", "deployments/rollback"),
        ("", "pods/attach"),
        ("", "namespaces/finalize"),
        ("", "buildconfigs/instantiatebinary"),
        ("", "buildconfigs/instantiate"),
        ("", "builds/clone"),
        ("", "deploymentconfigrollbacks"),
        ("", "generatedeploymentconfigs"),
        ("", "deploymentconfigs/rollback"),
        ("", "deploymentconfigs/instantiate"),
        ("", "imagestreamimports"),
        ("", "imagestreammappings"),
    ])
}

/// Flatten discovery lists into group/resource pairs
pub fn discovered_resources(lists: &[APIResourceList]) -> BTreeSet<GroupResource> {
    lists
        .iter()
        .flat_map(|list| {
            let group = match list.group_version.split_once('/') {
                Some((group, _version)) => group,
                None => "",
            };
            list.resources
                .iter()
                .map(move |r| GroupResource::new(group, r.name.clone()))
        })
        .collect()
}

/// Findings of one coverage run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageReport {
    /// Escalating resources the reader role grants
    pub escalating_granted: BTreeSet<GroupResource>,
    /// Readable resources the reader role does not cover
    pub missing: BTreeSet<GroupResource>,
}

impl CoverageReport {
    /// True when nothing was found
    pub fn is_clean(&self) -> bool {
        self.escalating_granted.is_empty() && self.missing.is_empty()
    }

    /// One message per finding, escalations first
    pub fn messages(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .escalating_granted
            .iter()
            .map(|gr| format!("cluster-reader role has escalating resource {}", gr))
            .collect();
        if !self.missing.is_empty() {
            let missing: Vec<String> = self.missing.iter().map(ToString::to_string).collect();
            out.push(format!("cluster-reader role is missing {}", missing.join(", ")));
        }
        out
    }
}

/// Compare reader `rules` against `discovered` resources.
///
/// Rule groups and resources are taken literally; a `*` in a rule only
/// covers a resource literally named `*`.
pub fn analyze(
    discovered: &BTreeSet<GroupResource>,
    rules: &[PolicyRule],
    escalating: &BTreeSet<GroupResource>,
    non_reading: &BTreeSet<GroupResource>,
) -> CoverageReport {
    let mut report = CoverageReport::default();
    let mut remaining = discovered.clone();

    for rule in rules {
        let groups = rule.api_groups.as_deref().unwrap_or_default();
        let resources = rule.resources.as_deref().unwrap_or_default();
        for group in groups {
            for resource in resources {
                let gr = GroupResource::new(group.as_str(), resource.as_str());
                if escalating.contains(&gr) {
                    report.escalating_granted.insert(gr.clone());
                }
                remaining.remove(&gr);
            }
        }
    }

    report.missing = remaining
        .into_iter()
        .filter(|gr| !escalating.contains(gr) && !non_reading.contains(gr))
        .collect();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;

    fn rule(groups: &[&str], resources: &[&str]) -> PolicyRule {
        PolicyRule {
            api_groups: Some(groups.iter().map(|s| s.to_string()).collect()),
            resources: Some(resources.iter().map(|s| s.to_string()).collect()),
            verbs: vec!["get".to_string(), "list".to_string(), "watch".to_string()],
            ..Default::default()
        }
    }

    fn resource_list(group_version: &str, names: &[&str]) -> APIResourceList {
        APIResourceList {
            group_version: group_version.to_string(),
            resources: names
                .iter()
                .map(|n| APIResource {
                    name: n.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn discovery_splits_group_from_version() {
        let found = discovered_resources(&[
            resource_list("v1", &["pods", "pods/exec"]),
            resource_list("apps.openshift.io/v1", &["deploymentconfigs"]),
        ]);
        assert!(found.contains(&GroupResource::core("pods/exec")));
        assert!(found.contains(&GroupResource::new(APPS_OPENSHIFT, "deploymentconfigs")));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn full_coverage_is_clean() {
        let discovered = discovered_resources(&[
            resource_list("v1", &["pods", "secrets", "pods/attach"]),
            resource_list("apps/v1", &["deployments"]),
        ]);
        let rules = [rule(&[""], &["pods"]), rule(&["apps"], &["deployments"])];
        let report = analyze(
            &discovered,
            &rules,
            &escalating_resources(),
            &non_reading_resources(),
        );
        assert!(report.is_clean(), "{:?}", report);
        assert!(report.messages().is_empty());
    }

    /// Story: a reader role that leaks secrets and forgets configmaps
    #[test]
    fn story_escalation_and_gap_are_both_reported() {
        let discovered =
            discovered_resources(&[resource_list("v1", &["pods", "configmaps", "secrets"])]);
        let rules = [rule(&[""], &["pods", "secrets"])];
        let report = analyze(
            &discovered,
            &rules,
            &escalating_resources(),
            &non_reading_resources(),
        );

        assert_eq!(
            report.escalating_granted.iter().collect::<Vec<_>>(),
            vec![&GroupResource::core("secrets")]
        );
        assert_eq!(
            report.missing.iter().collect::<Vec<_>>(),
            vec![&GroupResource::core("configmaps")]
        );
        assert_eq!(
            report.messages(),
            vec![
                "cluster-reader role has escalating resource secrets".to_string(),
                "cluster-reader role is missing configmaps".to_string(),
            ]
        );
    }

    #[test]
    fn group_qualified_names_render_resource_first() {
        assert_eq!(
            GroupResource::new(OAUTH, "oauthclients").to_string(),
            "oauthclients.oauth.openshift.io"
        );
    }

    #[test]
    fn rules_without_groups_cover_nothing() {
        let discovered = discovered_resources(&[resource_list("v1", &["pods"])]);
        let rules = [PolicyRule {
            resources: Some(vec!["pods".to_string()]),
            ..Default::default()
        }];
        let report = analyze(&discovered, &rules, &BTreeSet::new(), &BTreeSet::new());
        assert_eq!(report.missing.len(), 1);
    }
}
