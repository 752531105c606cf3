/**
 * CYCLE DE VIE DES PROPOSITIONS - pending → simulating → applied
 *
 * RÔLE :
 * Possède la liste des propositions d'optimisation issues de la dernière
 * analyse et les fait avancer dans le workflow d'application simulé.
 *
 * FONCTIONNEMENT :
 * - `ingest` remplace toute la liste, chaque entrée forcée à `pending`
 * - `apply_with` passe une proposition `pending` à `simulating` et planifie
 *   le passage à `applied` après un délai fixe (tâche tokio annulable)
 * - Transitions strictement en avant, pas d'annulation publique
 * - Chaque `ingest` incrémente une génération : les timers de l'ancienne
 *   liste sont avortés et leurs complétions ignorées
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::AbortHandle;

use crate::analysis::ProposalDraft;

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl FromStr for Impact {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Impact::High),
            "medium" => Ok(Impact::Medium),
            "low" => Ok(Impact::Low),
            _ => Err(UnknownVariant { kind: "impact", value: s.to_string() }),
        }
    }
}

impl TryFrom<String> for Impact {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ProposalType {
    Refactor,
    Migration,
    Consolidation,
    AiPrep,
}

impl FromStr for ProposalType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refactor" => Ok(ProposalType::Refactor),
            "migration" => Ok(ProposalType::Migration),
            "consolidation" => Ok(ProposalType::Consolidation),
            "ai-prep" => Ok(ProposalType::AiPrep),
            _ => Err(UnknownVariant { kind: "proposal type", value: s.to_string() }),
        }
    }
}

impl TryFrom<String> for ProposalType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Simulating,
    Applied,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalStatus::Pending => write!(f, "pending"),
            ProposalStatus::Simulating => write!(f, "simulating"),
            ProposalStatus::Applied => write!(f, "applied"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationProposal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    #[serde(rename = "type")]
    pub proposal_type: ProposalType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_after: Option<String>,
    pub status: ProposalStatus,
}

impl From<ProposalDraft> for OptimizationProposal {
    fn from(draft: ProposalDraft) -> Self {
        Self {
            id: draft.id,
            title: draft.title,
            description: draft.description,
            impact: draft.impact,
            proposal_type: draft.proposal_type,
            code_before: draft.code_before,
            code_after: draft.code_after,
            status: ProposalStatus::Pending,
        }
    }
}

/// Heuristique par nom : "db" ou "database" dans l'id ou le titre, sans
/// tenir compte de la casse. Ne dit rien des noeuds réellement touchés.
pub fn touches_database(proposal: &OptimizationProposal) -> bool {
    [&proposal.id, &proposal.title].iter().any(|field| {
        let lower = field.to_lowercase();
        lower.contains("db") || lower.contains("database")
    })
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LifecycleError {
    #[error("unknown proposal: {0}")]
    UnknownProposal(String),
    #[error("proposal {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: ProposalStatus,
        to: ProposalStatus,
    },
    #[error("completion for proposal {0} belongs to a replaced proposal list")]
    StaleCompletion(String),
}

/// Jeton remis au timer ; rattaché à la génération qui l'a émis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyTicket {
    pub id: String,
    generation: u64,
}

/// Résultat d'une complétion : la proposition passée à `applied` et le
/// signal destiné au contrôleur pour l'heuristique database.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub proposal: OptimizationProposal,
    pub touches_database: bool,
}

#[derive(Debug, Default)]
pub struct ProposalBook {
    proposals: Vec<OptimizationProposal>,
    generation: u64,
    timers: HashMap<String, AbortHandle>,
}

impl ProposalBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proposals(&self) -> &[OptimizationProposal] {
        &self.proposals
    }

    pub fn get(&self, id: &str) -> Option<&OptimizationProposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Remplace toute la liste ; aucune fusion avec l'analyse précédente
    pub fn ingest(&mut self, drafts: Vec<ProposalDraft>) {
        self.abort_timers();
        self.generation += 1;
        self.proposals = drafts.into_iter().map(OptimizationProposal::from).collect();
    }

    /// `pending` → `simulating`. Le timer est à la charge de l'appelant
    /// (voir `apply_with`).
    pub fn begin_apply(&mut self, id: &str) -> Result<ApplyTicket, LifecycleError> {
        let generation = self.generation;
        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| LifecycleError::UnknownProposal(id.to_string()))?;

        if proposal.status != ProposalStatus::Pending {
            return Err(LifecycleError::InvalidTransition {
                id: id.to_string(),
                from: proposal.status,
                to: ProposalStatus::Simulating,
            });
        }

        proposal.status = ProposalStatus::Simulating;
        Ok(ApplyTicket { id: id.to_string(), generation })
    }

    /// Passe à `simulating` et planifie `on_due(ticket)` après `delay`.
    pub fn apply_with<F>(&mut self, id: &str, delay: Duration, on_due: F) -> Result<&OptimizationProposal, LifecycleError>
    where
        F: FnOnce(ApplyTicket) + Send + 'static,
    {
        let ticket = self.begin_apply(id)?;
        let handle = schedule(delay, {
            let ticket = ticket.clone();
            move || on_due(ticket)
        });
        self.timers.insert(ticket.id.clone(), handle);
        self.get(id).ok_or_else(|| LifecycleError::UnknownProposal(id.to_string()))
    }

    /// `simulating` → `applied`
    pub fn complete(&mut self, ticket: ApplyTicket) -> Result<Applied, LifecycleError> {
        if ticket.generation != self.generation {
            return Err(LifecycleError::StaleCompletion(ticket.id));
        }
        self.timers.remove(&ticket.id);

        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.id == ticket.id)
            .ok_or_else(|| LifecycleError::UnknownProposal(ticket.id.clone()))?;

        if proposal.status != ProposalStatus::Simulating {
            return Err(LifecycleError::InvalidTransition {
                id: ticket.id,
                from: proposal.status,
                to: ProposalStatus::Applied,
            });
        }

        proposal.status = ProposalStatus::Applied;
        Ok(Applied {
            touches_database: touches_database(proposal),
            proposal: proposal.clone(),
        })
    }

    pub fn scheduled(&self) -> usize {
        self.timers.len()
    }

    fn abort_timers(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

impl Drop for ProposalBook {
    fn drop(&mut self) {
        self.abort_timers();
    }
}

/// Planifie `on_due` après `delay` sur le runtime courant.
/// L'échéance est fixée à l'appel, pas au premier poll de la tâche.
pub fn schedule<F>(delay: Duration, on_due: F) -> AbortHandle
where
    F: FnOnce() + Send + 'static,
{
    let deadline = tokio::time::Instant::now() + delay;
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        on_due();
    })
    .abort_handle()
}
