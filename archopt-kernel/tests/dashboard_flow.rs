//! Parcours complets : contrôleur + vrai client HTTP contre le service simulé.

use std::sync::Arc;
use std::time::Duration;

use archopt_devkit::{GeminiReply, ResponseBuilder, TestHarness};
use archopt_kernel::config::AnalysisConf;
use archopt_kernel::graph::NodeStatus;
use archopt_kernel::health::HealthTracker;
use archopt_kernel::proposals::ProposalStatus;
use archopt_kernel::{seed, Dashboard, GeminiClient, RunOutcome, Session};
use serde_json::json;

fn dashboard(endpoint: String, api_key: Option<&str>, apply_delay: Duration) -> Dashboard {
    let conf = AnalysisConf { endpoint, model: "mock".into(), timeout_secs: 5 };
    let client = GeminiClient::new(conf, api_key.map(String::from)).unwrap();
    let health = HealthTracker::new(client.has_credential());
    let session = Session::new(seed::initial_graph().unwrap(), 50);
    Dashboard::new(session, Arc::new(client), apply_delay, health)
}

fn messages(dashboard: &Dashboard) -> Vec<String> {
    dashboard.logs().into_iter().map(|l| l.message).collect()
}

#[tokio::test]
async fn raw_status_in_response_is_ignored_on_ingest() {
    let harness = TestHarness::new().await.unwrap();
    harness.reply_with(
        ResponseBuilder::sample()
            .set_proposal_field(0, "status", json!("applied"))
            .set_proposal_field(1, "status", json!("simulating"))
            .build(),
    );
    let dashboard = dashboard(harness.base_url(), Some("k"), Duration::ZERO);

    assert!(matches!(dashboard.run_analysis().await, RunOutcome::Completed(_)));
    assert!(dashboard.proposals().iter().all(|p| p.status == ProposalStatus::Pending));

    dashboard.apply_proposal("p2").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(dashboard.proposals()[1].status, ProposalStatus::Applied);
}

#[tokio::test]
async fn empty_proposal_list_is_reported() {
    let harness = TestHarness::new().await.unwrap();
    harness.reply_with(ResponseBuilder::new().score(90.0).breakdown(90.0, 90.0, 90.0, 90.0).build());
    let dashboard = dashboard(harness.base_url(), Some("k"), Duration::from_millis(10));

    assert!(matches!(dashboard.run_analysis().await, RunOutcome::Completed(_)));
    assert!(dashboard.proposals().is_empty());
    assert_eq!(messages(&dashboard)[0], "Detected 0 critical architectural improvements.");
}

#[tokio::test]
async fn missing_credential_fails_without_calling_service() {
    let harness = TestHarness::new().await.unwrap();
    harness.reply_with_sample();
    let dashboard = dashboard(harness.base_url(), None, Duration::from_millis(10));

    let outcome = dashboard.run_analysis().await;
    assert!(matches!(outcome, RunOutcome::Failed(ref m) if m.contains("credential")));
    assert!(harness.server.requests().is_empty());
    assert!(messages(&dashboard)[0].starts_with("Analysis failed: "));

    let health = dashboard.health().get_health(dashboard.session());
    assert_eq!(health.analysis_failures, 1);
    assert!(!health.credential_configured);
}

#[tokio::test]
async fn service_error_and_bad_json_are_reported() {
    let harness = TestHarness::new().await.unwrap();
    harness.fail_with(503, "model overloaded");
    harness.server.push_reply(GeminiReply::text("{not json"));
    let dashboard = dashboard(harness.base_url(), Some("k"), Duration::from_millis(10));

    assert!(matches!(dashboard.run_analysis().await, RunOutcome::Failed(ref m) if m.contains("503")));
    assert!(matches!(dashboard.run_analysis().await, RunOutcome::Failed(ref m) if m.contains("not valid JSON")));
    assert!(dashboard.report().is_none());
    assert!(dashboard.proposals().is_empty());
    assert!(!dashboard.is_analyzing());
}

#[tokio::test]
async fn concurrent_run_is_rejected_while_service_is_slow() {
    let harness = TestHarness::new().await.unwrap();
    harness.server.push_reply(
        GeminiReply::ok(ResponseBuilder::sample().build()).delayed(Duration::from_millis(200)),
    );
    let dashboard = dashboard(harness.base_url(), Some("k"), Duration::from_millis(10));

    let first = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.run_analysis().await }
    });
    harness.wait_for_requests(1, 1000).await.unwrap();

    assert!(dashboard.is_analyzing());
    assert_eq!(dashboard.run_analysis().await, RunOutcome::Busy);

    assert!(matches!(first.await.unwrap(), RunOutcome::Completed(_)));
    assert_eq!(harness.server.requests().len(), 1);
    assert_eq!(messages(&dashboard)[0], "Detected 3 critical architectural improvements.");
}

#[tokio::test]
async fn reanalysis_cancels_pending_simulation() {
    let harness = TestHarness::new().await.unwrap();
    harness.reply_with_sample();
    harness.reply_with_sample();
    let dashboard = dashboard(harness.base_url(), Some("k"), Duration::from_millis(150));

    dashboard.run_analysis().await;
    dashboard.apply_proposal("p1").unwrap();
    dashboard.run_analysis().await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(dashboard.proposals().iter().all(|p| p.status == ProposalStatus::Pending));
    assert!(!messages(&dashboard).iter().any(|m| m.starts_with("Refactoring successfully deployed")));
    assert_eq!(
        dashboard.graph().node(seed::DATABASE_TARGET_NODE).unwrap().status,
        NodeStatus::Unoptimized
    );
}

#[tokio::test]
async fn applied_database_proposal_updates_graph() {
    let harness = TestHarness::new().await.unwrap();
    harness.reply_with_sample();
    let dashboard = dashboard(harness.base_url(), Some("k"), Duration::from_millis(50));

    dashboard.run_analysis().await;
    dashboard.apply_proposal("p1").unwrap();
    dashboard.apply_proposal("p2").unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let statuses: Vec<_> = dashboard.proposals().into_iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![ProposalStatus::Applied, ProposalStatus::Applied, ProposalStatus::Pending]
    );
    assert_eq!(
        dashboard.graph().node(seed::DATABASE_TARGET_NODE).unwrap().status,
        NodeStatus::Healthy
    );
    assert_eq!(dashboard.summary().services, 6);
}
