use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{build_prompt, contract, AnalysisError, AnalysisResult, AnalysisService};
use crate::config::AnalysisConf;
use crate::graph::Graph;

/// Client Gemini `generateContent` avec sortie JSON contrainte par schéma
pub struct GeminiClient {
    config: AnalysisConf,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: AnalysisConf, api_key: Option<String>) -> Result<Self, AnalysisError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        Ok(Self { config, api_key, client })
    }

    /// Clé lue dans `GEMINI_API_KEY`, sinon `API_KEY`
    pub fn from_env(config: AnalysisConf) -> Result<Self, AnalysisError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .ok();
        Self::new(config, api_key)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": contract::response_schema()
            }
        })
    }
}

#[async_trait]
impl AnalysisService for GeminiClient {
    async fn analyze(&self, graph: &Graph) -> Result<AnalysisResult, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::MissingCredential)?;
        let prompt = build_prompt(graph.nodes(), graph.links())?;

        tracing::debug!(model = %self.config.model, "sending analysis request");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(&prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalysisError::Service { status: status.as_u16(), body });
        }

        let envelope: GenerateContentResponse = response.json().await?;
        let text: String = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyResponse);
        }
        contract::parse_response(&text)
    }
}
