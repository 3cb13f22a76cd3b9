//! Principals that can read everywhere
//!
//! A "who can get X" review in any namespace also returns the cluster's
//! global readers: admin users, reader groups and a long list of controller
//! service accounts. Scenarios add these to their expected sets. The list is
//! cluster-specific, so it is a configuration value handed to each scenario
//! rather than something baked into them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::decision::AccessDecision;

/// Users with cluster-wide read access on a stock OpenShift install
const CLUSTER_READER_USERS: &[&str] = &["system:admin"];

/// Groups with cluster-wide read access on a stock OpenShift install
const CLUSTER_READER_GROUPS: &[&str] = &[
    "system:cluster-readers",
    "system:cluster-admins",
    "system:masters",
];

/// Service accounts that can get deploymentconfigs in every namespace
const DEPLOYMENTCONFIG_GETTERS: &[&str] = &[
    "system:serviceaccount:kube-system:generic-garbage-collector",
    "system:serviceaccount:kube-system:namespace-controller",
    "system:serviceaccount:kube-system:clusterrole-aggregation-controller",
    "system:serviceaccount:openshift-infra:image-trigger-controller",
    "system:serviceaccount:openshift-infra:deploymentconfig-controller",
    "system:serviceaccount:openshift-infra:template-instance-controller",
    "system:serviceaccount:openshift-infra:template-instance-finalizer-controller",
    "system:serviceaccount:openshift-infra:unidling-controller",
    "system:serviceaccount:openshift-apiserver-operator:openshift-apiserver-operator",
    "system:serviceaccount:openshift-apiserver:openshift-apiserver-sa",
    "system:serviceaccount:openshift-authentication-operator:authentication-operator",
    "system:serviceaccount:openshift-authentication:oauth-openshift",
    "system:serviceaccount:openshift-cluster-version:default",
    "system:serviceaccount:openshift-controller-manager-operator:openshift-controller-manager-operator",
    "system:serviceaccount:openshift-controller-manager:openshift-controller-manager-sa",
    "system:serviceaccount:openshift-kube-apiserver-operator:kube-apiserver-operator",
    "system:serviceaccount:openshift-kube-apiserver:installer-sa",
    "system:serviceaccount:openshift-kube-controller-manager-operator:kube-controller-manager-operator",
    "system:serviceaccount:openshift-kube-controller-manager:installer-sa",
    "system:serviceaccount:openshift-kube-scheduler-operator:openshift-kube-scheduler-operator",
    "system:serviceaccount:openshift-kube-scheduler:installer-sa",
    "system:serviceaccount:openshift-machine-config-operator:default",
    "system:serviceaccount:openshift-network-operator:default",
    "system:serviceaccount:openshift-operator-lifecycle-manager:olm-operator-serviceaccount",
    "system:serviceaccount:openshift-service-ca-operator:service-ca-operator",
    "system:serviceaccount:openshift-service-catalog-apiserver-operator:openshift-service-catalog-apiserver-operator",
    "system:serviceaccount:openshift-service-catalog-controller-manager-operator:openshift-service-catalog-controller-manager-operator",
    "system:serviceaccount:openshift-support:gather",
];

/// Users and groups that every "who can read" answer is expected to include.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineReaders {
    /// Users with global read access
    #[serde(default)]
    pub users: BTreeSet<String>,
    /// Groups with global read access
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl BaselineReaders {
    /// Readers on a stock OpenShift cluster, including the controllers that
    /// can get deploymentconfigs
    pub fn openshift_defaults() -> Self {
        Self {
            users: CLUSTER_READER_USERS
                .iter()
                .chain(DEPLOYMENTCONFIG_GETTERS)
                .map(|s| s.to_string())
                .collect(),
            groups: CLUSTER_READER_GROUPS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True when there is nothing to add
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }

    /// Add the baseline principals to a "who can" expectation.
    ///
    /// Subject decisions (no subject sets) are returned unchanged.
    pub fn augment(&self, mut decision: AccessDecision) -> AccessDecision {
        if let Some(subjects) = decision.subjects.as_mut() {
            subjects.users.extend(self.users.iter().cloned());
            subjects.groups.extend(self.groups.iter().cloned());
        }
        decision
    }
}
