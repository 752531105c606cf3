use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::activity::ActivityLog;
use crate::graph::Graph;
use crate::proposals::ProposalBook;
use crate::report::{AnalysisReport, DashboardSummary};

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Onglet affiché ; état de vue pur, sans effet sur le modèle.
/// `simulation` est déclaré mais n'a pas encore de contenu propre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Dashboard,
    Proposals,
    Simulation,
}

/// État de session du dashboard, possédé par le contrôleur.
/// Toutes les mutations passent par `Dashboard`.
#[derive(Debug)]
pub struct Session {
    pub graph: Graph,
    pub report: Option<AnalysisReport>,
    pub proposals: ProposalBook,
    pub log: ActivityLog,
    pub tab: Tab,
    pub(crate) analyzing: bool,
}

impl Session {
    pub fn new(graph: Graph, log_capacity: usize) -> Self {
        let mut log = ActivityLog::new(log_capacity);
        log.push("[SYSTEM] Initialization complete.");
        log.push("[AGENT] Awaiting system analysis...");

        Self {
            graph,
            report: None,
            proposals: ProposalBook::new(),
            log,
            tab: Tab::default(),
            analyzing: false,
        }
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary::collect(self.report.as_ref(), &self.graph)
    }
}
