/**
 * ARCHOPT KERNEL - Point d'entrée du serveur
 *
 * RÔLE : Bootstrap : .env, logging, config, client d'analyse, session seedée,
 * puis API REST du dashboard.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use archopt_kernel::config::load_config;
use archopt_kernel::health::HealthTracker;
use archopt_kernel::http::{self, AppState};
use archopt_kernel::{seed, Dashboard, GeminiClient, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Ok si .env n'existe pas
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("archopt_kernel=info")),
        )
        .init();

    let cfg = load_config().await;

    let client = GeminiClient::from_env(cfg.analysis.clone()).context("building analysis client")?;
    if !client.has_credential() {
        warn!("no GEMINI_API_KEY / API_KEY set, analysis runs will fail until one is provided");
    }
    let health = HealthTracker::new(client.has_credential());

    let graph = seed::initial_graph().context("seed graph")?;
    let session = Session::new(graph, cfg.activity.capacity);
    let dashboard = Dashboard::new(session, Arc::new(client), cfg.simulation.apply_delay(), health);

    let app = http::build_router(AppState { dashboard });

    let addr: SocketAddr = format!("{}:{}", cfg.http.bind, cfg.http.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cfg.http.bind, cfg.http.port))?;
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    info!(model = %cfg.analysis.model, "listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
