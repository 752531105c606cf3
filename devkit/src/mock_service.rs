/*!
Service d'analyse simulé pour développement sans clé Gemini

Serveur HTTP local qui parle le format `generateContent` : enregistre chaque
requête reçue et renvoie les réponses mises en file par le test.
*/

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Requête reçue par le mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Réponse programmée
#[derive(Debug, Clone)]
pub struct GeminiReply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl GeminiReply {
    /// Enveloppe un payload d'analyse comme texte du premier candidat
    pub fn ok(payload: Value) -> Self {
        Self::text(payload.to_string())
    }

    /// Texte brut dans l'enveloppe (pour simuler un JSON invalide)
    pub fn text<S: Into<String>>(text: S) -> Self {
        let envelope = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text.into() }] },
                "finishReason": "STOP"
            }]
        });
        Self { status: 200, body: envelope.to_string(), delay: None }
    }

    /// Erreur HTTP du service
    pub fn status<S: Into<String>>(status: u16, message: S) -> Self {
        let body = serde_json::json!({
            "error": { "code": status, "message": message.into() }
        });
        Self { status, body: body.to_string(), delay: None }
    }

    /// Retarde la réponse (utile pour les tests "analyse en cours")
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
struct Inner {
    requests: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<VecDeque<GeminiReply>>,
}

/// Mock du service Gemini, arrêté au drop
pub struct MockAnalysisServer {
    addr: SocketAddr,
    inner: Arc<Inner>,
    task: JoinHandle<()>,
}

impl MockAnalysisServer {
    /// Démarre le serveur sur un port libre de 127.0.0.1
    pub async fn start() -> Result<Self> {
        let inner = Arc::new(Inner::default());
        let app = Router::new().fallback(handle).with_state(inner.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("[MOCK] analysis server stopped: {}", e);
            }
        });

        log::info!("[MOCK] analysis service listening on {}", addr);
        Ok(Self { addr, inner, task })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn push_reply(&self, reply: GeminiReply) {
        self.inner.replies.lock().unwrap().push_back(reply);
    }

    /// Récupère toutes les requêtes reçues (pour assertions de tests)
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn pending_replies(&self) -> usize {
        self.inner.replies.lock().unwrap().len()
    }

    /// Parse le texte du prompt de la dernière requête
    pub fn last_prompt(&self) -> Option<String> {
        self.requests().last().and_then(|r| {
            r.body["contents"][0]["parts"][0]["text"].as_str().map(|s| s.to_string())
        })
    }

    pub fn clear(&self) {
        self.inner.requests.lock().unwrap().clear();
        self.inner.replies.lock().unwrap().clear();
    }
}

impl Drop for MockAnalysisServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(State(inner): State<Arc<Inner>>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let api_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

    inner.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        api_key,
        body,
    });
    log::info!("[MOCK] analysis request on {}", uri.path());

    let reply = inner.replies.lock().unwrap().pop_front();
    let Some(reply) = reply else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "no reply queued").into_response();
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [("content-type", "application/json")], reply.body).into_response()
}
