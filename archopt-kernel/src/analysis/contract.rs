//! Contrat de réponse du service d'analyse.
//!
//! Le schéma est déclaré une fois (`response_schema`, envoyé au service) et
//! la réponse est revalidée ici : toute déviation échoue fermé.

use serde_json::{json, Value};
use std::collections::HashSet;

use super::{AnalysisError, AnalysisResult};

/// Schéma `responseSchema` au format Gemini (sous-ensemble OpenAPI)
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "NUMBER" },
            "healthBreakdown": {
                "type": "OBJECT",
                "properties": {
                    "scalability": { "type": "NUMBER" },
                    "maintainability": { "type": "NUMBER" },
                    "aiReadiness": { "type": "NUMBER" },
                    "efficiency": { "type": "NUMBER" }
                },
                "required": ["scalability", "maintainability", "aiReadiness", "efficiency"]
            },
            "proposals": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "impact": { "type": "STRING", "format": "enum", "enum": ["high", "medium", "low"] },
                        "type": {
                            "type": "STRING",
                            "format": "enum",
                            "enum": ["refactor", "migration", "consolidation", "ai-prep"]
                        },
                        "codeBefore": { "type": "STRING" },
                        "codeAfter": { "type": "STRING" }
                    },
                    "required": ["id", "title", "description", "impact", "type"]
                }
            }
        },
        "required": ["score", "healthBreakdown", "proposals"]
    })
}

/// Parse le texte renvoyé par le service puis valide le contrat
pub fn parse_response(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let raw: Value = serde_json::from_str(text).map_err(AnalysisError::Parse)?;
    let result: AnalysisResult =
        serde_json::from_value(raw).map_err(|e| AnalysisError::Contract(e.to_string()))?;
    validate(&result)?;
    Ok(result)
}

fn check_score(field: &str, value: f64) -> Result<(), AnalysisError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(AnalysisError::Contract(format!("{field} must be within 0-100, got {value}")));
    }
    Ok(())
}

fn validate(result: &AnalysisResult) -> Result<(), AnalysisError> {
    check_score("score", result.score)?;
    for (field, value) in result.health_breakdown.iter() {
        check_score(&format!("healthBreakdown.{field}"), value)?;
    }

    let mut ids = HashSet::new();
    for proposal in &result.proposals {
        if proposal.id.trim().is_empty() {
            return Err(AnalysisError::Contract("proposal id must not be empty".into()));
        }
        if !ids.insert(proposal.id.as_str()) {
            return Err(AnalysisError::Contract(format!("duplicate proposal id: {}", proposal.id)));
        }
    }
    Ok(())
}
