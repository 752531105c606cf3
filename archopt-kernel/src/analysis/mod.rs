/**
 * CLIENT D'ANALYSE - Graphe → prompt → service de génération structurée → résultat typé
 *
 * RÔLE :
 * Formate le graphe courant en prompt, émet exactement une requête vers le
 * service externe avec un schéma de sortie strict, puis valide la réponse.
 *
 * CONTRAT :
 * - Aucune relance, aucune récupération partielle
 * - Transport, statut HTTP, JSON invalide ou contrat violé → `AnalysisError`
 * - Le graphe d'entrée n'est jamais modifié
 */

pub mod contract;
pub mod gemini;

use async_trait::async_trait;
use serde::Deserialize;

use crate::graph::{Graph, SystemLink, SystemNode};
use crate::proposals::{Impact, ProposalType};
use crate::report::HealthBreakdown;

pub use gemini::GeminiClient;

/// Résultat validé d'une analyse
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub score: f64,
    pub health_breakdown: HealthBreakdown,
    pub proposals: Vec<ProposalDraft>,
}

/// Proposition telle que renvoyée par le service. Pas de champ `status` :
/// un statut éventuel dans la réponse est ignoré.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDraft {
    pub id: String,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    #[serde(rename = "type")]
    pub proposal_type: ProposalType,
    pub code_before: Option<String>,
    pub code_after: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis service credential is not configured (set GEMINI_API_KEY)")]
    MissingCredential,
    #[error("could not encode graph for the prompt: {0}")]
    Encode(serde_json::Error),
    #[error("analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("analysis service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("analysis service returned no content")]
    EmptyResponse,
    #[error("analysis response is not valid JSON: {0}")]
    Parse(serde_json::Error),
    #[error("analysis response violates contract: {0}")]
    Contract(String),
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, graph: &Graph) -> Result<AnalysisResult, AnalysisError>;
}

pub fn build_prompt(nodes: &[SystemNode], links: &[SystemLink]) -> Result<String, AnalysisError> {
    let nodes = serde_json::to_string(nodes).map_err(AnalysisError::Encode)?;
    let links = serde_json::to_string(links).map_err(AnalysisError::Encode)?;

    Ok(format!(
        "Analyze this system architecture for inefficiencies and AI readiness.\n\
         Nodes: {nodes}\n\
         Links: {links}\n\
         \n\
         Identify:\n\
         1. Redundant data storage.\n\
         2. Communication bottlenecks.\n\
         3. Blocks to AI integration (e.g., missing vector storage, unstructured legacy APIs).\n\
         \n\
         Propose 3 specific technical refactors in JSON format."
    ))
}
