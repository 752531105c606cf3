/*!
Helpers pour construire des réponses d'analyse conformes (ou non) au contrat

Facilite l'écriture de tests avec :
- Une réponse type à trois propositions
- Des mutations ciblées (champ manquant, score hors borne...)
- Le chargement de fixtures JSON depuis le disque
*/

use anyhow::Result;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Construction d'un payload `{score, healthBreakdown, proposals}`
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    payload: Value,
}

impl ResponseBuilder {
    /// Payload vide mais valide : score 0, sous-scores à 0, aucune proposition
    pub fn new() -> Self {
        Self {
            payload: json!({
                "score": 0,
                "healthBreakdown": {
                    "scalability": 0, "maintainability": 0, "aiReadiness": 0, "efficiency": 0
                },
                "proposals": []
            }),
        }
    }

    /// Réponse type : trois propositions dont une qui vise la base
    pub fn sample() -> Self {
        Self::new()
            .score(62.0)
            .breakdown(55.0, 48.0, 30.0, 71.0)
            .proposal("p1", "Consolidate Database", "high", "consolidation")
            .proposal("p2", "Replace SOAP bridge with async events", "medium", "migration")
            .proposal("p3", "Add vector store for AI search", "low", "ai-prep")
    }

    /// Charge une fixture JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self { payload: serde_json::from_str(&content)? })
    }

    pub fn score(mut self, score: f64) -> Self {
        self.payload["score"] = json!(score);
        self
    }

    pub fn breakdown(mut self, scalability: f64, maintainability: f64, ai_readiness: f64, efficiency: f64) -> Self {
        self.payload["healthBreakdown"] = json!({
            "scalability": scalability,
            "maintainability": maintainability,
            "aiReadiness": ai_readiness,
            "efficiency": efficiency
        });
        self
    }

    /// Ajoute une proposition avec une description générique
    pub fn proposal(self, id: &str, title: &str, impact: &str, proposal_type: &str) -> Self {
        self.proposal_value(json!({
            "id": id,
            "title": title,
            "description": format!("{title}: generated for tests"),
            "impact": impact,
            "type": proposal_type
        }))
    }

    /// Ajoute une proposition brute (champs arbitraires, y compris `status`)
    pub fn proposal_value(mut self, proposal: Value) -> Self {
        if let Some(list) = self.payload["proposals"].as_array_mut() {
            list.push(proposal);
        }
        self
    }

    /// Retire un sous-score de `healthBreakdown`
    pub fn without_breakdown(mut self, field: &str) -> Self {
        if let Some(obj) = self.payload["healthBreakdown"].as_object_mut() {
            obj.remove(field);
        }
        self
    }

    /// Retire un champ de premier niveau
    pub fn without(mut self, field: &str) -> Self {
        if let Value::Object(ref mut obj) = self.payload {
            obj.remove(field);
        }
        self
    }

    /// Définit un champ arbitraire sur une proposition existante
    pub fn set_proposal_field(mut self, index: usize, field: &str, value: Value) -> Self {
        if let Some(Value::Object(obj)) = self.payload["proposals"].get_mut(index) {
            obj.insert(field.to_string(), value);
        }
        self
    }

    /// Champs requis par le contrat et absents du payload
    pub fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let empty = Map::new();
        let root = self.payload.as_object().unwrap_or(&empty);
        for field in ["score", "healthBreakdown", "proposals"] {
            if !root.contains_key(field) {
                missing.push(field.to_string());
            }
        }
        if let Some(breakdown) = root.get("healthBreakdown").and_then(|b| b.as_object()) {
            for field in ["scalability", "maintainability", "aiReadiness", "efficiency"] {
                if !breakdown.contains_key(field) {
                    missing.push(format!("healthBreakdown.{field}"));
                }
            }
        }
        missing
    }

    pub fn build(self) -> Value {
        self.payload
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_is_complete() {
        let builder = ResponseBuilder::sample();
        assert!(builder.missing_required().is_empty());

        let payload = builder.build();
        assert_eq!(payload["proposals"].as_array().unwrap().len(), 3);
        assert_eq!(payload["proposals"][0]["title"], "Consolidate Database");
        assert_eq!(payload["healthBreakdown"]["aiReadiness"], 30.0);
    }

    #[test]
    fn test_mutations() {
        let builder = ResponseBuilder::sample()
            .without_breakdown("efficiency")
            .set_proposal_field(1, "status", json!("applied"));
        assert_eq!(builder.missing_required(), vec!["healthBreakdown.efficiency"]);
        assert_eq!(builder.build()["proposals"][1]["status"], "applied");

        let no_score = ResponseBuilder::new().without("score");
        assert_eq!(no_score.missing_required(), vec!["score"]);
    }

    #[test]
    fn test_fixture_loading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analysis.json");
        std::fs::write(&path, ResponseBuilder::sample().score(12.0).build().to_string()).unwrap();

        let loaded = ResponseBuilder::from_file(&path).unwrap().build();
        assert_eq!(loaded["score"], 12.0);
    }
}
