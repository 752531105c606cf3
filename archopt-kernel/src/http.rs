/**
 * API REST ARCHOPT - Serveur HTTP du dashboard
 *
 * RÔLE :
 * Expose chaque point d'entrée du contrôleur au front-end (graphe, rapport,
 * propositions, journal, onglet) et l'état du kernel.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, réponses JSON
 * - Échecs d'analyse → 502 + message (déjà journalisé côté session)
 * - Analyse déjà en cours → 409
 * - Pas d'authentification : hors périmètre
 */

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::activity::LogEntryView;
use crate::dashboard::{ApplyOutcome, Dashboard, RunOutcome};
use crate::graph::{Graph, GraphInput, Position, SystemNode};
use crate::health::KernelHealth;
use crate::proposals::OptimizationProposal;
use crate::report::{AnalysisReport, DashboardSummary};
use crate::seed::{MetricSample, SYSTEM_HEALTH_METRICS};
use crate::session::Tab;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(code: StatusCode, msg: impl ToString) -> ApiError {
    (code, Json(json!({ "ok": false, "msg": msg.to_string() })))
}

#[derive(Debug, Deserialize)]
struct TabBody {
    tab: Tab,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/graph", get(get_graph).put(put_graph))
        .route("/graph/nodes/{id}/pos", put(move_node))
        .route("/analysis", post(run_analysis))
        .route("/report", get(get_report))
        .route("/summary", get(get_summary))
        .route("/proposals", get(list_proposals))
        .route("/proposals/{id}/apply", post(apply_proposal))
        .route("/logs", get(get_logs))
        .route("/metrics/history", get(get_metrics_history))
        .route("/view/tab", get(get_tab).put(put_tab))
        .with_state(app_state)
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    let dashboard = &app.dashboard;
    Json(dashboard.health().get_health(dashboard.session()))
}

// GET /graph
async fn get_graph(State(app): State<AppState>) -> Json<Graph> {
    Json(app.dashboard.graph())
}

// PUT /graph (remplacement validé)
async fn put_graph(
    State(app): State<AppState>,
    Json(input): Json<GraphInput>,
) -> Result<Json<Graph>, ApiError> {
    app.dashboard
        .replace_graph(input)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    Ok(Json(app.dashboard.graph()))
}

// PUT /graph/nodes/{id}/pos (drag-to-reposition)
async fn move_node(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(pos): Json<Position>,
) -> Result<Json<SystemNode>, ApiError> {
    app.dashboard
        .move_node(&id, pos)
        .map(Json)
        .map_err(|e| api_error(StatusCode::NOT_FOUND, e))
}

// POST /analysis
async fn run_analysis(State(app): State<AppState>) -> Result<Json<AnalysisReport>, ApiError> {
    match app.dashboard.run_analysis().await {
        RunOutcome::Completed(report) => Ok(Json(report)),
        RunOutcome::Failed(msg) => Err(api_error(StatusCode::BAD_GATEWAY, msg)),
        RunOutcome::Busy => Err(api_error(StatusCode::CONFLICT, "analysis already in progress")),
    }
}

// GET /report (null tant qu'aucune analyse n'a réussi)
async fn get_report(State(app): State<AppState>) -> Json<Option<AnalysisReport>> {
    Json(app.dashboard.report())
}

// GET /summary
async fn get_summary(State(app): State<AppState>) -> Json<DashboardSummary> {
    Json(app.dashboard.summary())
}

// GET /proposals
async fn list_proposals(State(app): State<AppState>) -> Json<Vec<OptimizationProposal>> {
    Json(app.dashboard.proposals())
}

// POST /proposals/{id}/apply
async fn apply_proposal(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OptimizationProposal>, ApiError> {
    match app.dashboard.apply_proposal(&id) {
        Ok(ApplyOutcome::Started(p)) | Ok(ApplyOutcome::Ignored(p)) => Ok(Json(p)),
        // transition invalide → Ignored ; complétion périmée → jamais à l'appel
        Err(e) => Err(api_error(StatusCode::NOT_FOUND, e)),
    }
}

// GET /logs (plus récent en premier)
async fn get_logs(State(app): State<AppState>) -> Json<Vec<LogEntryView>> {
    Json(app.dashboard.logs())
}

// GET /metrics/history (série fixe des graphiques)
async fn get_metrics_history() -> Json<Vec<MetricSample>> {
    Json(SYSTEM_HEALTH_METRICS.to_vec())
}

// GET /view/tab
async fn get_tab(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "tab": app.dashboard.tab() }))
}

// PUT /view/tab
async fn put_tab(State(app): State<AppState>, Json(body): Json<TabBody>) -> Json<serde_json::Value> {
    app.dashboard.select_tab(body.tab);
    Json(json!({ "tab": body.tab }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GeminiClient;
    use crate::config::AnalysisConf;
    use crate::health::HealthTracker;
    use crate::seed;
    use crate::session::Session;
    use archopt_devkit::{ResponseBuilder, TestHarness};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(endpoint: String, delay: Duration) -> (Router, Dashboard) {
        let conf = AnalysisConf { endpoint, model: "mock".into(), timeout_secs: 5 };
        let client = GeminiClient::new(conf, Some("test-key".into())).unwrap();
        let session = Session::new(seed::initial_graph().unwrap(), 50);
        let dashboard = Dashboard::new(session, Arc::new(client), delay, HealthTracker::new(true));
        (build_router(AppState { dashboard: dashboard.clone() }), dashboard)
    }

    async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_analysis_round_trip_through_mock_service() {
        let mut harness = TestHarness::new().await.unwrap();
        harness.expect_requests(1);
        harness.reply_with_sample();
        let (router, _) = app(harness.base_url(), Duration::from_millis(10));

        let (status, report) = call(&router, "POST", "/analysis", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["score"], 62.0);
        assert_eq!(report["bottlenecks"][0], "Consolidate Database");

        let (_, proposals) = call(&router, "GET", "/proposals", None).await;
        let proposals = proposals.as_array().unwrap();
        assert_eq!(proposals.len(), 3);
        assert!(proposals.iter().all(|p| p["status"] == "pending"));

        let (_, summary) = call(&router, "GET", "/summary", None).await;
        assert_eq!(summary["healthScore"], 62.0);
        assert_eq!(summary["aiReadiness"], 30.0);

        harness.verify_expectations().unwrap();
        harness.assert_prompt_contains("Legacy SOAP API").unwrap();
    }

    #[tokio::test]
    async fn test_contract_violation_is_bad_gateway_and_logged() {
        let harness = TestHarness::new().await.unwrap();
        harness.reply_with(ResponseBuilder::sample().without_breakdown("efficiency").build());
        let (router, dashboard) = app(harness.base_url(), Duration::from_millis(10));

        let (status, body) = call(&router, "POST", "/analysis", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["msg"].as_str().unwrap().contains("efficiency"));

        let (_, report) = call(&router, "GET", "/report", None).await;
        assert!(report.is_null());
        assert!(dashboard.logs()[0].message.starts_with("Analysis failed"));
        assert!(!dashboard.is_analyzing());
    }

    #[tokio::test]
    async fn test_apply_flow_over_http() {
        let harness = TestHarness::new().await.unwrap();
        harness.reply_with_sample();
        let (router, _) = app(harness.base_url(), Duration::from_millis(50));
        call(&router, "POST", "/analysis", None).await;

        let (status, p) = call(&router, "POST", "/proposals/p1/apply", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(p["status"], "simulating");

        let (status, p) = call(&router, "POST", "/proposals/p1/apply", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(p["status"], "simulating");

        let (status, body) = call(&router, "POST", "/proposals/ghost/apply", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "unknown proposal: ghost");

        tokio::time::sleep(Duration::from_millis(150)).await;

        let (_, proposals) = call(&router, "GET", "/proposals", None).await;
        assert_eq!(proposals[0]["status"], "applied");
        let (_, graph) = call(&router, "GET", "/graph", None).await;
        let n3 = graph["nodes"].as_array().unwrap().iter().find(|n| n["id"] == "n3").unwrap();
        assert_eq!(n3["status"], "healthy");
    }

    #[tokio::test]
    async fn test_graph_view_and_static_routes() {
        let (router, _) = app("http://127.0.0.1:9".into(), Duration::from_millis(10));

        let (status, node) = call(&router, "PUT", "/graph/nodes/n1/pos", Some(json!({"x": 7.5, "y": 3}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(node["pos"]["x"], 7.5);
        assert_eq!(node["status"], "legacy");

        let (status, _) = call(&router, "PUT", "/graph/nodes/zz/pos", Some(json!({"x": 0, "y": 0}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let dangling = json!({
            "nodes": [{"id": "a", "label": "A", "type": "service", "status": "healthy", "details": "", "pos": {"x": 0, "y": 0}}],
            "links": [{"source": "a", "target": "b", "latency": 10, "type": "sync"}]
        });
        let (status, body) = call(&router, "PUT", "/graph", Some(dangling)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["msg"].as_str().unwrap().contains("unknown node b"));

        let (_, tab) = call(&router, "PUT", "/view/tab", Some(json!({"tab": "proposals"}))).await;
        assert_eq!(tab["tab"], "proposals");
        let (_, tab) = call(&router, "GET", "/view/tab", None).await;
        assert_eq!(tab["tab"], "proposals");

        let (_, history) = call(&router, "GET", "/metrics/history", None).await;
        assert_eq!(history.as_array().unwrap().len(), 4);
        assert_eq!(history[3]["aiScore"], 40);

        let (_, logs) = call(&router, "GET", "/logs", None).await;
        assert_eq!(logs[0]["message"], "[AGENT] Awaiting system analysis...");

        let (_, health) = call(&router, "GET", "/system/health", None).await;
        assert_eq!(health["analysis_runs"], 0);
        assert_eq!(health["credential_configured"], true);
    }
}
