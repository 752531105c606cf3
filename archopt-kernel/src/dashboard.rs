/**
 * CONTRÔLEUR DU DASHBOARD - Orchestration de session
 *
 * RÔLE :
 * Point d'entrée unique de toutes les mutations : lancement d'analyse,
 * application des propositions, déplacement de noeuds, onglet courant.
 *
 * FONCTIONNEMENT :
 * - `run_analysis` : flag busy (garde RAII), deux lignes de journal, appel du
 *   service, puis remplacement complet rapport + propositions ou ligne d'échec
 * - Une seule analyse en vol ; un second appel renvoie `Busy` sans rien toucher
 * - `apply_proposal` : délègue au cycle de vie, la complétion revient ici
 *   pour le journal et l'heuristique database
 * - Le mutex de session n'est jamais tenu à travers un `.await`
 */

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::activity::LogEntryView;
use crate::analysis::AnalysisService;
use crate::graph::{Graph, GraphError, GraphInput, NodeStatus, Position, SystemNode};
use crate::health::HealthTracker;
use crate::proposals::{ApplyTicket, LifecycleError, OptimizationProposal};
use crate::report::{AnalysisReport, DashboardSummary};
use crate::seed::DATABASE_TARGET_NODE;
use crate::session::{Session, Shared, Tab};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(AnalysisReport),
    Failed(String),
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// La proposition vient de passer à `simulating`
    Started(OptimizationProposal),
    /// Déjà `simulating` ou `applied` : rien n'a changé
    Ignored(OptimizationProposal),
}

/// Remet le flag busy à false quoi qu'il arrive (succès, échec, future abandonnée)
struct BusyGuard {
    session: Shared<Session>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.session.lock().analyzing = false;
    }
}

#[derive(Clone)]
pub struct Dashboard {
    session: Shared<Session>,
    analyzer: Arc<dyn AnalysisService>,
    apply_delay: Duration,
    health: HealthTracker,
}

impl Dashboard {
    pub fn new(session: Session, analyzer: Arc<dyn AnalysisService>, apply_delay: Duration, health: HealthTracker) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            analyzer,
            apply_delay,
            health,
        }
    }

    pub fn session(&self) -> &Shared<Session> {
        &self.session
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub async fn run_analysis(&self) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let (graph, busy) = {
            let mut s = self.session.lock();
            if s.analyzing {
                tracing::warn!(%run_id, "analysis already in flight, ignoring request");
                return RunOutcome::Busy;
            }
            s.analyzing = true;
            s.log.push("Starting full system deep scan...");
            s.log.push("Extracting DB schemas and API signatures...");
            (s.graph.clone(), BusyGuard { session: self.session.clone() })
        };

        tracing::info!(%run_id, nodes = graph.nodes().len(), links = graph.links().len(), "analysis started");
        let started = Instant::now();
        let result = self.analyzer.analyze(&graph).await;
        self.health.record_run(result.is_ok(), started.elapsed());

        let outcome = {
            let mut guard = self.session.lock();
            let s = &mut *guard;
            match result {
                Ok(result) => {
                    let report = AnalysisReport::from(&result);
                    let count = result.proposals.len();
                    s.report = Some(report.clone());
                    s.proposals.ingest(result.proposals);
                    s.log.push(format!("Analysis complete. System Health Score: {}%", report.score));
                    s.log.push(format!("Detected {count} critical architectural improvements."));
                    tracing::info!(%run_id, score = report.score, proposals = count, "analysis completed");
                    RunOutcome::Completed(report)
                }
                Err(e) => {
                    let message = e.to_string();
                    s.log.push(format!("Analysis failed: {message}"));
                    tracing::warn!(%run_id, error = %message, "analysis failed");
                    RunOutcome::Failed(message)
                }
            }
        };

        drop(busy);
        outcome
    }

    /// Seule erreur renvoyée : `UnknownProposal`
    pub fn apply_proposal(&self, id: &str) -> Result<ApplyOutcome, LifecycleError> {
        let weak = Arc::downgrade(&self.session);
        let mut guard = self.session.lock();
        let s = &mut *guard;

        let started = s
            .proposals
            .apply_with(id, self.apply_delay, move |ticket| finish_apply(&weak, ticket))
            .cloned();

        match started {
            Ok(proposal) => {
                s.log.push(format!("Simulating impact for proposal {id}..."));
                tracing::info!(proposal = id, delay_ms = self.apply_delay.as_millis() as u64, "simulation scheduled");
                Ok(ApplyOutcome::Started(proposal))
            }
            Err(LifecycleError::InvalidTransition { from, .. }) => {
                tracing::debug!(proposal = id, status = %from, "apply ignored");
                s.proposals
                    .get(id)
                    .cloned()
                    .map(ApplyOutcome::Ignored)
                    .ok_or_else(|| LifecycleError::UnknownProposal(id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub fn move_node(&self, id: &str, pos: Position) -> Result<SystemNode, GraphError> {
        self.session.lock().graph.move_node(id, pos).cloned()
    }

    /// Remplace le graphe après validation ; rapport et propositions restent intacts
    pub fn replace_graph(&self, input: GraphInput) -> Result<(), GraphError> {
        let graph = Graph::try_from(input)?;
        let mut s = self.session.lock();
        tracing::info!(nodes = graph.nodes().len(), links = graph.links().len(), "graph replaced");
        s.graph = graph;
        Ok(())
    }

    pub fn select_tab(&self, tab: Tab) {
        self.session.lock().tab = tab;
    }

    pub fn tab(&self) -> Tab {
        self.session.lock().tab
    }

    pub fn graph(&self) -> Graph {
        self.session.lock().graph.clone()
    }

    pub fn report(&self) -> Option<AnalysisReport> {
        self.session.lock().report.clone()
    }

    pub fn proposals(&self) -> Vec<OptimizationProposal> {
        self.session.lock().proposals.proposals().to_vec()
    }

    pub fn logs(&self) -> Vec<LogEntryView> {
        self.session.lock().log.entries().map(|e| e.to_view()).collect()
    }

    pub fn summary(&self) -> DashboardSummary {
        self.session.lock().summary()
    }

    pub fn is_analyzing(&self) -> bool {
        self.session.lock().is_analyzing()
    }
}

/// Complétion du timer. Session disparue : l'effet est perdu.
fn finish_apply(session: &Weak<Mutex<Session>>, ticket: ApplyTicket) {
    let Some(session) = session.upgrade() else {
        return;
    };
    let mut guard = session.lock();
    let s = &mut *guard;

    match s.proposals.complete(ticket) {
        Ok(applied) => {
            s.log.push(format!(
                "Refactoring successfully deployed to staging for {}.",
                applied.proposal.id
            ));
            tracing::info!(proposal = %applied.proposal.id, "proposal applied");

            if applied.touches_database {
                if s.graph.set_node_status(DATABASE_TARGET_NODE, NodeStatus::Healthy) {
                    tracing::info!(node = DATABASE_TARGET_NODE, "database node marked healthy");
                } else {
                    tracing::warn!(node = DATABASE_TARGET_NODE, "database node missing from current graph");
                }
            }
        }
        Err(e) => tracing::debug!("completion dropped: {e}"),
    }
}
