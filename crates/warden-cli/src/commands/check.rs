//! `warden check`: poll one access review until it matches
//!
//! The flags describe one question, who asks it, and the expected answer.
//! Subject checks go to both surfaces unless `--surface` narrows them;
//! resource checks only exist on the project surface.

use clap::{ArgGroup, Args, ValueEnum};
use warden_common::kube_utils::Identity;
use warden_review::pretty::{ANY_NAMESPACE, CURRENT_NAMESPACE};
use warden_review::reviewer::submit;
use warden_review::{
    assert_eventually, AccessDecision, AccessQuery, AccessReviewer, Action, BaselineReaders,
    ErrorMatch, Expectation, KubeReviewer, ReviewKind, ReviewScope, ScenarioReport, SubjectSets,
};

use super::finish_report;
use crate::context::{identity_for, ClusterContext};
use crate::{Error, Result};

/// Which question is asked
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Can the principal do it?
    Subject,
    /// Who can do it?
    Resource,
}

/// Which API answers it
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SurfaceArg {
    /// authorization.openshift.io
    Openshift,
    /// authorization.k8s.io
    Kube,
}

/// Arguments for `warden check`
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("outcome").args(["expect_allowed", "expect_denied", "expect_error"])
))]
pub struct CheckArgs {
    /// Review kind
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Evaluate within this namespace (cluster-wide when omitted)
    #[arg(long)]
    pub namespace: Option<String>,

    /// User the question is about (the caller when omitted)
    #[arg(long)]
    pub user: Option<String>,

    /// Group the question is about; repeatable
    #[arg(long = "group")]
    pub groups: Vec<String>,

    /// Submit the review as this user
    #[arg(long = "as", value_name = "USER", conflicts_with = "anonymous")]
    pub as_user: Option<String>,

    /// Submit the review without credentials
    #[arg(long)]
    pub anonymous: bool,

    /// Verb, e.g. get, create, delete
    #[arg(long)]
    pub verb: String,

    /// Resource, e.g. pods, deploymentconfigs
    #[arg(long)]
    pub resource: String,

    /// API group of the resource
    #[arg(long, default_value = "")]
    pub api_group: String,

    /// API version of the resource
    #[arg(long, default_value = "")]
    pub api_version: String,

    /// Name of a single object
    #[arg(long)]
    pub name: Option<String>,

    /// Ask only this surface
    #[arg(long, value_enum)]
    pub surface: Option<SurfaceArg>,

    /// Expect the action to be allowed
    #[arg(long)]
    pub expect_allowed: bool,

    /// Expect the action to be denied
    #[arg(long)]
    pub expect_denied: bool,

    /// Expect the review itself to fail with this text
    #[arg(long, value_name = "TEXT")]
    pub expect_error: Option<String>,

    /// Match --expect-error as a prefix instead of a substring
    #[arg(long, requires = "expect_error")]
    pub prefix: bool,

    /// Expected reason prefix
    #[arg(long, default_value = "")]
    pub reason: String,

    /// User expected in a "who can" answer; repeatable
    #[arg(long = "expect-user")]
    pub expect_users: Vec<String>,

    /// Group expected in a "who can" answer; repeatable
    #[arg(long = "expect-group")]
    pub expect_groups: Vec<String>,

    /// Add the configured baseline readers to the expected answer
    #[arg(long)]
    pub with_baseline: bool,
}

impl CheckArgs {
    /// Review kind as the library names it
    pub fn kind(&self) -> ReviewKind {
        match self.kind {
            KindArg::Subject => ReviewKind::Subject,
            KindArg::Resource => ReviewKind::Resource,
        }
    }

    /// Cluster-wide unless `--namespace` is given
    pub fn scope(&self) -> ReviewScope {
        match &self.namespace {
            Some(ns) => ReviewScope::Local(ns.clone()),
            None => ReviewScope::Cluster,
        }
    }

    /// The verb and resource being asked about
    pub fn action(&self) -> Action {
        let action = Action::new(&self.verb, &self.resource)
            .in_group(&self.api_group)
            .with_version(&self.api_version);
        match &self.name {
            Some(name) => action.named(name),
            None => action,
        }
    }

    /// The principal and action; an empty user asks about the caller
    pub fn query(&self) -> AccessQuery {
        AccessQuery {
            user: self.user.clone().unwrap_or_default(),
            groups: self.groups.clone(),
            action: self.action(),
        }
    }

    /// Identity that submits the review
    pub fn caller(&self) -> Identity {
        if self.anonymous {
            return Identity::Anonymous;
        }
        match &self.as_user {
            Some(user) => identity_for(user),
            None => Identity::Configured,
        }
    }

    fn description(&self) -> String {
        let who = match (&self.user, self.groups.is_empty()) {
            (Some(user), _) => user.clone(),
            (None, false) => format!("groups [{}]", self.groups.join(", ")),
            (None, true) => "caller".to_string(),
        };
        let what = if self.api_group.is_empty() {
            self.resource.clone()
        } else {
            format!("{}.{}", self.resource, self.api_group)
        };
        let place = match &self.namespace {
            Some(ns) => format!("in namespace {:?}", ns),
            None => "cluster-wide".to_string(),
        };
        match self.kind {
            KindArg::Subject => format!("can {} {} {} {}", who, self.verb, what, place),
            KindArg::Resource => format!("who can {} {} {}", self.verb, what, place),
        }
    }

    /// Expected outcome, validated against the review kind
    pub fn expectation(&self, baseline: &BaselineReaders) -> Result<Expectation> {
        let description = self.description();
        let namespace = self.namespace.clone().unwrap_or_default();
        let lists_given = !self.expect_users.is_empty() || !self.expect_groups.is_empty();

        let expectation = if let Some(text) = &self.expect_error {
            let matcher = if self.prefix {
                ErrorMatch::Prefix(text.clone())
            } else {
                ErrorMatch::Contains(text.clone())
            };
            Expectation::error(description, matcher)
        } else {
            match self.kind {
                KindArg::Subject => {
                    if lists_given || self.with_baseline {
                        return Err(Error::validation(
                            "--expect-user, --expect-group and --with-baseline apply to resource checks only",
                        ));
                    }
                    let mut decision = if self.expect_allowed {
                        AccessDecision::allowed(namespace, "")
                    } else if self.expect_denied {
                        AccessDecision::denied(namespace)
                    } else {
                        return Err(Error::validation(
                            "subject checks need --expect-allowed, --expect-denied or --expect-error",
                        ));
                    };
                    decision.reason = self.reason.clone();
                    Expectation::decision(description, decision)
                }
                KindArg::Resource => {
                    if self.expect_allowed || self.expect_denied {
                        return Err(Error::validation(
                            "resource checks expect --expect-user/--expect-group lists, not an allow or deny",
                        ));
                    }
                    let mut decision = AccessDecision::who_can(
                        namespace,
                        SubjectSets::new(self.expect_users.iter(), self.expect_groups.iter()),
                    );
                    if self.with_baseline {
                        decision = baseline.augment(decision);
                    }
                    Expectation::decision(description, decision)
                }
            }
        };

        let default_scope = match self.scope() {
            ReviewScope::Cluster => ANY_NAMESPACE,
            ReviewScope::Local(_) => CURRENT_NAMESPACE,
        };
        Ok(expectation.for_action(self.action(), default_scope))
    }

    /// Surfaces to ask, in order
    pub fn surfaces(&self, openshift_api: bool) -> Result<Vec<SurfaceArg>> {
        let surfaces = match (self.kind, self.surface) {
            (KindArg::Resource, Some(SurfaceArg::Kube)) => {
                return Err(Error::validation(
                    "the kube surface does not serve resource access reviews",
                ))
            }
            (KindArg::Resource, _) => vec![SurfaceArg::Openshift],
            (KindArg::Subject, Some(surface)) => vec![surface],
            (KindArg::Subject, None) if openshift_api => {
                vec![SurfaceArg::Openshift, SurfaceArg::Kube]
            }
            (KindArg::Subject, None) => vec![SurfaceArg::Kube],
        };
        if !openshift_api && surfaces.contains(&SurfaceArg::Openshift) {
            return Err(Error::validation(
                "the project authorization API is disabled in configuration (openshift_api: false)",
            ));
        }
        Ok(surfaces)
    }
}

fn reviewer(
    ctx: &ClusterContext,
    surface: SurfaceArg,
    caller: &Identity,
) -> Result<Box<dyn AccessReviewer>> {
    let reviewer: Box<dyn AccessReviewer> = match surface {
        SurfaceArg::Openshift => Box::new(ctx.project_reviewer(caller)?),
        SurfaceArg::Kube => Box::new(KubeReviewer::new(ctx.client(caller)?)),
    };
    Ok(reviewer)
}

/// Poll the review on each selected surface and report every mismatch
pub async fn run(ctx: &ClusterContext, args: CheckArgs) -> Result<()> {
    let expectation = args.expectation(&ctx.baseline)?;
    let surfaces = args.surfaces(ctx.openshift_api)?;
    let caller = args.caller();
    let kind = args.kind();
    let scope = &args.scope();
    let query = &args.query();
    let expectation = &expectation;

    let report = ScenarioReport::new("check");
    for surface in surfaces {
        let reviewer = reviewer(ctx, surface, &caller)?;
        let reviewer = reviewer.as_ref();
        let description = format!("{} with {}", expectation.description, reviewer.surface());

        report
            .step(&description, || async {
                let outcome = assert_eventually(
                    &description,
                    &ctx.settings,
                    move || submit(reviewer, kind, scope, query),
                    |actual| expectation.check(actual),
                )
                .await;
                report.record_poll(outcome);
                Ok(())
            })
            .await;
    }
    finish_report(&report)
}
