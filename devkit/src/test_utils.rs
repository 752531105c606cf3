/*!
Test Harness pour le kernel ArchOptimizer

Facilite l'écriture de tests avec:
- Démarrage automatique du service d'analyse simulé
- Attente et assertions sur les requêtes reçues
- Expectations sur le nombre d'appels
*/

use crate::mock_service::{GeminiReply, MockAnalysisServer, RecordedRequest};
use crate::response_builders::ResponseBuilder;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

/// Harness de test complet autour du mock d'analyse
pub struct TestHarness {
    pub server: MockAnalysisServer,
    expected_requests: Option<usize>,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        env_logger::try_init().ok(); // Init logging pour tests

        Ok(Self {
            server: MockAnalysisServer::start().await?,
            expected_requests: None,
        })
    }

    pub fn base_url(&self) -> String {
        self.server.base_url()
    }

    /// Met en file la réponse type
    pub fn reply_with_sample(&self) -> &Self {
        self.server.push_reply(GeminiReply::ok(ResponseBuilder::sample().build()));
        self
    }

    pub fn reply_with(&self, payload: Value) -> &Self {
        self.server.push_reply(GeminiReply::ok(payload));
        self
    }

    pub fn fail_with(&self, status: u16, message: &str) -> &Self {
        self.server.push_reply(GeminiReply::status(status, message));
        self
    }

    /// On s'attend à recevoir exactement N requêtes
    pub fn expect_requests(&mut self, count: usize) -> &mut Self {
        self.expected_requests = Some(count);
        self
    }

    /// Attend qu'au moins N requêtes soient arrivées
    pub async fn wait_for_requests(&self, count: usize, timeout_ms: u64) -> Result<Vec<RecordedRequest>> {
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_millis(timeout_ms) {
            let requests = self.server.requests();
            if requests.len() >= count {
                return Ok(requests);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        log::warn!("Timeout waiting for {} analysis requests", count);
        anyhow::bail!("expected {} requests, got {}", count, self.server.requests().len());
    }

    pub fn verify_expectations(&self) -> Result<()> {
        if let Some(expected) = self.expected_requests {
            let actual = self.server.requests().len();
            if actual != expected {
                anyhow::bail!("expected {} analysis requests, got {}", expected, actual);
            }
            log::info!("Analysis service: {} requests as expected", actual);
        }
        Ok(())
    }

    /// Assert que le dernier prompt contient un fragment
    pub fn assert_prompt_contains(&self, fragment: &str) -> Result<()> {
        match self.server.last_prompt() {
            Some(prompt) if prompt.contains(fragment) => Ok(()),
            Some(_) => anyhow::bail!("last prompt does not contain {:?}", fragment),
            None => anyhow::bail!("no prompt received"),
        }
    }

    pub fn reset(&mut self) {
        self.server.clear();
        self.expected_requests = None;
    }
}
