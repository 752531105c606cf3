//! Rapport d'analyse : score global, sous-scores de santé et goulots.
//!
//! Un seul rapport vivant à la fois ; chaque analyse réussie le remplace
//! entièrement (voir `Session`).

use crate::analysis::AnalysisResult;
use crate::graph::{Graph, NodeStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBreakdown {
    pub scalability: f64,
    pub maintainability: f64,
    pub ai_readiness: f64,
    pub efficiency: f64,
}

impl HealthBreakdown {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("scalability", self.scalability),
            ("maintainability", self.maintainability),
            ("aiReadiness", self.ai_readiness),
            ("efficiency", self.efficiency),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub score: f64,
    pub health_breakdown: HealthBreakdown,
    /// Titres des propositions, dans l'ordre de la réponse
    pub bottlenecks: Vec<String>,
}

impl From<&AnalysisResult> for AnalysisReport {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            score: result.score,
            health_breakdown: result.health_breakdown,
            bottlenecks: result.proposals.iter().map(|p| p.title.clone()).collect(),
        }
    }
}

/// Les quatre cartes en tête du dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub health_score: Option<f64>,
    pub ai_readiness: Option<f64>,
    pub bottlenecks: usize,
    pub services: usize,
}

impl DashboardSummary {
    pub fn collect(report: Option<&AnalysisReport>, graph: &Graph) -> Self {
        Self {
            health_score: report.map(|r| r.score),
            ai_readiness: report.map(|r| r.health_breakdown.ai_readiness),
            bottlenecks: graph.count_with_status(NodeStatus::Bottleneck),
            services: graph.nodes().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ProposalDraft;
    use crate::proposals::{Impact, ProposalType};
    use crate::seed;

    fn draft(id: &str, title: &str) -> ProposalDraft {
        ProposalDraft {
            id: id.into(),
            title: title.into(),
            description: "d".into(),
            impact: Impact::High,
            proposal_type: ProposalType::Refactor,
            code_before: None,
            code_after: None,
        }
    }

    #[test]
    fn test_bottlenecks_follow_proposal_order() {
        let result = AnalysisResult {
            score: 64.0,
            health_breakdown: HealthBreakdown {
                scalability: 50.0,
                maintainability: 40.0,
                ai_readiness: 20.0,
                efficiency: 70.0,
            },
            proposals: vec![draft("b", "Second"), draft("a", "First")],
        };

        let report = AnalysisReport::from(&result);
        assert_eq!(report.score, 64.0);
        assert_eq!(report.bottlenecks, vec!["Second", "First"]);
    }

    #[test]
    fn test_summary_without_report() {
        let graph = seed::initial_graph().unwrap();
        let summary = DashboardSummary::collect(None, &graph);
        assert_eq!(summary.health_score, None);
        assert_eq!(summary.ai_readiness, None);
        assert_eq!(summary.bottlenecks, 1);
        assert_eq!(summary.services, 6);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["healthScore"].is_null());
    }
}
