//! Polled review cases, optionally asked through both surfaces
//!
//! A [`SubjectReviewCase`] is one question with one expected answer. It is
//! polled through the project surface and then through the kube surface;
//! the two must agree on the decision while each may reject with its own
//! error text. A [`ResourceReviewCase`] is a "who can" question, which only
//! the project surface can answer.

use std::sync::Arc;

use tracing::{debug, info};

use crate::decision::AccessDecision;
use crate::expectation::{ErrorMatch, Expectation};
use crate::poll::{assert_eventually, PollSettings};
use crate::pretty::{ANY_NAMESPACE, CURRENT_NAMESPACE};
use crate::query::{AccessQuery, Action, ReviewKind, ReviewScope};
use crate::report::ScenarioReport;
use crate::reviewer::{submit, AccessReviewer};

/// The surfaces available to one identity.
///
/// `project` is absent on clusters without the project authorization API;
/// `kube` is absent when a case deliberately exercises only one surface.
#[derive(Clone, Default)]
pub struct ReviewSurfaces {
    /// `authorization.openshift.io` surface
    pub project: Option<Arc<dyn AccessReviewer>>,
    /// `authorization.k8s.io` surface
    pub kube: Option<Arc<dyn AccessReviewer>>,
}

impl ReviewSurfaces {
    /// Both surfaces
    pub fn new(project: Arc<dyn AccessReviewer>, kube: Arc<dyn AccessReviewer>) -> Self {
        Self {
            project: Some(project),
            kube: Some(kube),
        }
    }

    /// Drop the project surface
    pub fn kube_only(mut self) -> Self {
        self.project = None;
        self
    }
}

/// "Can P do A?" asked of every available surface.
#[derive(Clone, Debug)]
pub struct SubjectReviewCase {
    /// Scenario description
    pub description: String,
    /// Where the review is evaluated
    pub scope: ReviewScope,
    /// The question
    pub query: AccessQuery,
    /// Expected decision when no error is expected
    pub expected: AccessDecision,
    /// Expected error prefix from the project surface
    pub error: Option<String>,
    /// Expected error prefix from the kube surface; falls back to `error`
    pub kube_error: Option<String>,
    /// Namespace for the kube half when neither the query nor the expected
    /// decision names one
    pub kube_namespace: Option<String>,
    /// Allow the case to run without a kube surface
    pub kube_skip: bool,
}

impl SubjectReviewCase {
    /// A review evaluated within `namespace`
    pub fn local(
        description: impl Into<String>,
        namespace: impl Into<String>,
        query: AccessQuery,
    ) -> Self {
        Self::new(description, ReviewScope::Local(namespace.into()), query)
    }

    /// A cluster-scoped review
    pub fn cluster(description: impl Into<String>, query: AccessQuery) -> Self {
        Self::new(description, ReviewScope::Cluster, query)
    }

    fn new(description: impl Into<String>, scope: ReviewScope, query: AccessQuery) -> Self {
        Self {
            description: description.into(),
            scope,
            query,
            expected: AccessDecision::default(),
            error: None,
            kube_error: None,
            kube_namespace: None,
            kube_skip: false,
        }
    }

    /// Expect this decision
    pub fn expect(mut self, decision: AccessDecision) -> Self {
        self.expected = decision;
        self
    }

    /// Expect both surfaces to fail with `prefix` (unless overridden for kube)
    pub fn expect_error(mut self, prefix: impl Into<String>) -> Self {
        self.error = Some(prefix.into());
        self
    }

    /// Expect the kube surface to fail with `prefix`
    pub fn expect_kube_error(mut self, prefix: impl Into<String>) -> Self {
        self.kube_error = Some(prefix.into());
        self
    }

    /// Namespace the kube half falls back to
    pub fn kube_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.kube_namespace = Some(namespace.into());
        self
    }

    /// Permit a missing kube surface
    pub fn skip_kube(mut self) -> Self {
        self.kube_skip = true;
        self
    }

    fn expectation(&self, error: Option<&String>, expected: AccessDecision) -> Expectation {
        match error {
            Some(prefix) => {
                Expectation::error(&self.description, ErrorMatch::Prefix(prefix.clone()))
            }
            None => Expectation::decision(&self.description, expected),
        }
    }

    /// Namespace the kube half evaluates a local review in
    pub fn kube_scope(&self) -> Result<ReviewScope, String> {
        if self.scope == ReviewScope::Cluster {
            return Ok(ReviewScope::Cluster);
        }
        let candidates = [
            self.query.action.namespace.as_str(),
            self.expected.namespace.as_str(),
            self.kube_namespace.as_deref().unwrap_or_default(),
        ];
        candidates
            .into_iter()
            .find(|ns| !ns.is_empty())
            .map(|ns| ReviewScope::Local(ns.to_string()))
            .ok_or_else(|| {
                format!(
                    "{}: no valid namespace found for kube auth test",
                    self.description
                )
            })
    }

    /// Poll every available surface, recording failures in `report`
    pub async fn run(
        &self,
        surfaces: &ReviewSurfaces,
        settings: &PollSettings,
        report: &ScenarioReport,
    ) {
        match &surfaces.project {
            Some(project) => {
                let expectation = self.expectation(self.error.as_ref(), self.expected.clone());
                self.poll(project.as_ref(), &self.scope, &expectation, settings, report)
                    .await;
            }
            None => info!(case = %self.description, "Project authorization API disabled, skipping"),
        }

        let Some(kube) = &surfaces.kube else {
            if !self.kube_skip {
                report.error(format!(
                    "{}: missing kube auth interface and test is not whitelisted",
                    self.description
                ));
            }
            return;
        };

        let scope = match self.kube_scope() {
            Ok(scope) => scope,
            Err(message) => {
                report.error(message);
                return;
            }
        };

        // the kube status does not echo a namespace, so agreement is judged
        // in the namespace the review was actually sent to
        let mut expected = self.expected.clone();
        expected.namespace = scope.namespace().unwrap_or_default().to_string();
        let error = self.kube_error.as_ref().or(self.error.as_ref());
        let expectation = self.expectation(error, expected);
        self.poll(kube.as_ref(), &scope, &expectation, settings, report)
            .await;
    }

    async fn poll(
        &self,
        reviewer: &dyn AccessReviewer,
        scope: &ReviewScope,
        expectation: &Expectation,
        settings: &PollSettings,
        report: &ScenarioReport,
    ) {
        let description = format!("{} with {}", self.description, reviewer.surface());
        debug!(case = %description, "Polling subject access review");
        let query = &self.query;
        let outcome = assert_eventually(
            &description,
            settings,
            move || submit(reviewer, ReviewKind::Subject, scope, query),
            |actual| expectation.check(actual),
        )
        .await;
        report.record_poll(outcome);
    }
}

/// "Who can do A?" asked of the project surface.
#[derive(Clone, Debug)]
pub struct ResourceReviewCase {
    /// Scenario description
    pub description: String,
    /// Where the review is evaluated
    pub scope: ReviewScope,
    /// The action being asked about
    pub action: Action,
    /// Expected answer
    pub expected: AccessDecision,
    /// Expected error substring
    pub error: Option<String>,
}

impl ResourceReviewCase {
    /// A "who can" review within `namespace`
    pub fn local(
        description: impl Into<String>,
        namespace: impl Into<String>,
        action: Action,
    ) -> Self {
        Self::new(description, ReviewScope::Local(namespace.into()), action)
    }

    /// A "who can" review across all namespaces
    pub fn cluster(description: impl Into<String>, action: Action) -> Self {
        Self::new(description, ReviewScope::Cluster, action)
    }

    fn new(description: impl Into<String>, scope: ReviewScope, action: Action) -> Self {
        Self {
            description: description.into(),
            scope,
            action,
            expected: AccessDecision::default(),
            error: None,
        }
    }

    /// Expect this answer
    pub fn expect(mut self, decision: AccessDecision) -> Self {
        self.expected = decision;
        self
    }

    /// Expect a failure whose message contains `text`
    pub fn expect_error(mut self, text: impl Into<String>) -> Self {
        self.error = Some(text.into());
        self
    }

    fn expectation(&self) -> Expectation {
        let base = match &self.error {
            Some(text) => Expectation::error(&self.description, ErrorMatch::Contains(text.clone())),
            None => Expectation::decision(&self.description, self.expected.clone()),
        };
        let default_scope = match self.scope {
            ReviewScope::Cluster => ANY_NAMESPACE,
            ReviewScope::Local(_) => CURRENT_NAMESPACE,
        };
        base.for_action(self.action.clone(), default_scope)
    }

    /// Poll `reviewer`, recording failures in `report`
    pub async fn run(
        &self,
        reviewer: &dyn AccessReviewer,
        settings: &PollSettings,
        report: &ScenarioReport,
    ) {
        let expectation = self.expectation();
        let query = AccessQuery::for_caller(self.action.clone());
        let query = &query;
        let scope = &self.scope;
        let outcome = assert_eventually(
            &self.description,
            settings,
            move || submit(reviewer, ReviewKind::Resource, scope, query),
            |actual| expectation.check(actual),
        )
        .await;
        report.record_poll(outcome);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::decision::SubjectSets;
    use crate::error::ReviewError;
    use crate::reviewer::MockAccessReviewer;

    fn settings() -> PollSettings {
        PollSettings::new(Duration::from_millis(100), Duration::from_secs(1))
    }

    fn forbidden(message: String) -> ReviewError {
        ReviewError::Status {
            code: 403,
            reason: "Forbidden".to_string(),
            message,
        }
    }

    fn project_mock(
        f: impl Fn(&str, &AccessQuery) -> Result<AccessDecision, ReviewError> + Send + 'static,
    ) -> MockAccessReviewer {
        let mut mock = MockAccessReviewer::new();
        mock.expect_surface().return_const("openshift api");
        mock.expect_create_local_access_review()
            .returning(move |_, ns, q| f(ns, q));
        mock
    }

    fn forbidden_local(group: &'static str, user: &'static str) -> impl Fn(&str) -> ReviewError {
        move |ns: &str| {
            forbidden(format!(
                r#"localsubjectaccessreviews.{group} is forbidden: User "{user}" cannot create resource "localsubjectaccessreviews" in API group "{group}" in the namespace "{ns}""#
            ))
        }
    }

    /// Story: harold asks about edgar in a project he does not administer.
    /// Each surface refuses with its own API group in the message.
    #[tokio::test(start_paused = true)]
    async fn story_both_surfaces_refuse_with_their_own_message() {
        let project_err = forbidden_local("authorization.openshift.io", "harold");
        let kube_err = forbidden_local("authorization.k8s.io", "harold");
        let project = project_mock(move |ns, _| Err(project_err(ns)));

        let mut kube = MockAccessReviewer::new();
        kube.expect_surface().return_const("kube api");
        kube.expect_create_local_access_review()
            .withf(|_, ns, _| ns == "mallet")
            .returning(move |_, ns, _| Err(kube_err(ns)));

        let case = SubjectReviewCase::local(
            "harold denied ability to run subject access review in project mallet",
            "mallet",
            AccessQuery::for_user("edgar", Action::new("delete", "pods")),
        )
        .kube_namespace("mallet")
        .expect_error(
            r#"localsubjectaccessreviews.authorization.openshift.io is forbidden: User "harold" cannot create resource "localsubjectaccessreviews" in API group "authorization.openshift.io" in the namespace "mallet""#,
        )
        .expect_kube_error(
            r#"localsubjectaccessreviews.authorization.k8s.io is forbidden: User "harold" cannot create resource "localsubjectaccessreviews" in API group "authorization.k8s.io" in the namespace "mallet""#,
        );

        let report = ScenarioReport::new("subject-access");
        let surfaces = ReviewSurfaces::new(Arc::new(project), Arc::new(kube));
        report
            .step(&case.description, || async {
                case.run(&surfaces, &settings(), &report).await;
                Ok(())
            })
            .await;
        assert!(report.finish().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn kube_error_defaults_to_project_error() {
        let message =
            r#"subjectaccessreviews.authorization.openshift.io is forbidden: User "danny""#;
        let mut project = MockAccessReviewer::new();
        project.expect_surface().return_const("openshift api");
        project
            .expect_create_access_review()
            .returning(move |_, _| Err(forbidden(message.to_string())));
        let mut kube = MockAccessReviewer::new();
        kube.expect_surface().return_const("kube api");
        kube.expect_create_access_review()
            .returning(|_, _| {
                Err(forbidden(
                    "subjectaccessreviews.authorization.k8s.io is forbidden".to_string(),
                ))
            });

        let case = SubjectReviewCase::cluster(
            "as danny, can I make cluster subject access reviews",
            AccessQuery::for_user("danny", Action::new("get", "projects")),
        )
        .expect_error(message);

        let report = ScenarioReport::new("subject-access");
        let surfaces = ReviewSurfaces::new(Arc::new(project), Arc::new(kube));
        report
            .step("danny", || async {
                case.run(&surfaces, &settings(), &report).await;
                Ok(())
            })
            .await;

        // the kube half is held to the project text and never matches
        let results = report.results();
        assert_eq!(results[0].failures.len(), 2);
        let first = &results[0].failures[0];
        assert!(first.contains("expected\n\tsubjectaccessreviews.authorization.openshift.io"));
        assert!(results[0].failures[1].contains("with kube api: timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn kube_half_judges_namespace_where_it_was_sent() {
        let project = project_mock(|ns, _| Ok(AccessDecision::denied(ns)));
        let mut kube = MockAccessReviewer::new();
        kube.expect_surface().return_const("kube api");
        kube.expect_create_local_access_review()
            .withf(|_, ns, q| ns == "nonexistent-project" && q.is_self())
            .returning(|_, ns, _| Ok(AccessDecision::denied(ns)));

        let case = SubjectReviewCase::local(
            "harold told he cannot create pods in project nonexistent-project",
            "nonexistent-project",
            AccessQuery::for_caller(Action::new("create", "pods")),
        )
        .expect(AccessDecision::denied("nonexistent-project"));

        let report = ScenarioReport::new("subject-access");
        case.run(
            &ReviewSurfaces::new(Arc::new(project), Arc::new(kube)),
            &settings(),
            &report,
        )
        .await;
        assert!(report.finish().is_ok());
    }

    #[test]
    fn kube_namespace_resolution_order() {
        let query = AccessQuery::for_user("edgar", Action::new("delete", "pods"));
        let case = SubjectReviewCase::local("c", "mallet", query.clone());
        assert_eq!(
            case.kube_scope().unwrap_err(),
            "c: no valid namespace found for kube auth test"
        );

        let case = case.kube_namespace("fallback");
        assert_eq!(case.kube_scope().unwrap(), ReviewScope::Local("fallback".to_string()));

        let case = case.expect(AccessDecision::denied("expected-ns"));
        assert_eq!(case.kube_scope().unwrap(), ReviewScope::Local("expected-ns".to_string()));

        let mut pinned = query;
        pinned.action.namespace = "query-ns".to_string();
        let case = SubjectReviewCase::local("c", "mallet", pinned)
            .expect(AccessDecision::denied("expected-ns"));
        assert_eq!(case.kube_scope().unwrap(), ReviewScope::Local("query-ns".to_string()));

        let cluster = SubjectReviewCase::cluster("c", AccessQuery::default());
        assert_eq!(cluster.kube_scope().unwrap(), ReviewScope::Cluster);
    }

    #[tokio::test(start_paused = true)]
    async fn unresolvable_kube_namespace_is_recorded() {
        let project = project_mock(|_, _| Err(forbidden("refused".to_string())));
        let kube = MockAccessReviewer::new();
        let case = SubjectReviewCase::local(
            "no namespace",
            "mallet",
            AccessQuery::for_user("edgar", Action::new("delete", "pods")),
        )
        .expect_error("refused");

        let report = ScenarioReport::new("subject-access");
        case.run(
            &ReviewSurfaces::new(Arc::new(project), Arc::new(kube)),
            &settings(),
            &report,
        )
        .await;
        assert_eq!(
            report.finish().unwrap_err(),
            "1 step(s) failed in subject-access: setup"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_kube_surface_fails_unless_skipped() {
        let query = AccessQuery::for_caller(Action::new("create", "pods"));
        let expected = AccessDecision::allowed("hammer", "RBAC");

        let report = ScenarioReport::new("s");
        let project = project_mock(|ns, _| Ok(AccessDecision::allowed(ns, "RBAC: allowed")));
        let project: Arc<dyn AccessReviewer> = Arc::new(project);
        let surfaces = ReviewSurfaces {
            project: Some(project),
            kube: None,
        };

        SubjectReviewCase::local("strict", "hammer", query.clone())
            .expect(expected.clone())
            .run(&surfaces, &settings(), &report)
            .await;
        let results_err = report.finish().unwrap_err();
        assert!(results_err.contains("setup"));

        let report = ScenarioReport::new("s");
        SubjectReviewCase::local("lenient", "hammer", query)
            .expect(expected)
            .skip_kube()
            .run(&surfaces, &settings(), &report)
            .await;
        assert!(report.finish().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_project_api_runs_kube_half_only() {
        let mut kube = MockAccessReviewer::new();
        kube.expect_surface().return_const("kube api");
        kube.expect_create_access_review()
            .times(1)
            .returning(|_, _| {
                Ok(AccessDecision::allowed(
                    "",
                    "RBAC: allowed by ClusterRoleBinding \"cluster-admins\"",
                ))
            });

        let surfaces =
            ReviewSurfaces::new(Arc::new(MockAccessReviewer::new()), Arc::new(kube)).kube_only();
        let report = ScenarioReport::new("s");
        SubjectReviewCase::cluster(
            "cluster admins can create projects",
            AccessQuery::for_groups(["system:cluster-admins"], Action::new("create", "projects")),
        )
        .expect(AccessDecision::allowed("", "RBAC: allowed by ClusterRoleBinding"))
        .run(&surfaces, &settings(), &report)
        .await;
        assert!(report.finish().is_ok());
    }

    /// Story: a cluster-wide "who can" from a project admin is refused, while
    /// the same question in their own project lists the members
    #[tokio::test(start_paused = true)]
    async fn story_resource_review_contains_match_and_member_lists() {
        let mut mock = MockAccessReviewer::new();
        mock.expect_create_access_review()
            .withf(|kind, q| *kind == ReviewKind::Resource && q.is_self())
            .returning(|_, _| {
                Err(forbidden(
                    r#"resourceaccessreviews.authorization.openshift.io is forbidden: User "mark" cannot create resource "resourceaccessreviews""#.to_string(),
                ))
            });
        mock.expect_create_local_access_review()
            .returning(|_, ns, _| {
                Ok(AccessDecision::who_can(
                    ns,
                    SubjectSets::new(
                        ["mark", "edgar", "admin", "system:admin"],
                        ["system:masters"],
                    ),
                ))
            });

        let action = Action::new("get", "deploymentconfigs");
        let report = ScenarioReport::new("resource-access");

        ResourceReviewCase::cluster("who can view deploymentconfigs in all by mark", action.clone())
            .expect_error("cannot ")
            .run(&mock, &settings(), &report)
            .await;

        ResourceReviewCase::local(
            "who can view deploymentconfigs in mallet by mark",
            "mallet",
            action.clone(),
        )
        .expect(AccessDecision::who_can(
            "mallet",
            SubjectSets::new(["admin", "mark", "edgar", "system:admin"], ["system:masters"]),
        ))
        .run(&mock, &settings(), &report)
        .await;
        assert!(report.finish().is_ok());

        let report = ScenarioReport::new("resource-access");
        ResourceReviewCase::local("missing valerie", "mallet", action)
            .expect(AccessDecision::who_can(
                "mallet",
                SubjectSets::new(["valerie"], Vec::<String>::new()),
            ))
            .run(&mock, &settings(), &report)
            .await;
        report.finish().unwrap_err();
        let failures = &report.results()[0].failures;
        assert!(failures[0].contains("who can get deploymentconfigs (in the current namespace)"));
    }
}
