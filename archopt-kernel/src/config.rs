use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct KernelConfig {
    pub http: HttpConf,
    pub analysis: AnalysisConf,
    pub simulation: SimulationConf,
    pub activity: ActivityConf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpConf {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConf {
    pub endpoint: String, // ex: "https://generativelanguage.googleapis.com/v1beta"
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConf {
    pub apply_delay_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ActivityConf {
    pub capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            http: HttpConf::default(),
            analysis: AnalysisConf::default(),
            simulation: SimulationConf::default(),
            activity: ActivityConf::default(),
        }
    }
}

impl Default for HttpConf {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 8080 }
    }
}

impl Default for AnalysisConf {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            model: DEFAULT_MODEL.into(),
            timeout_secs: 60,
        }
    }
}

impl Default for SimulationConf {
    fn default() -> Self {
        Self { apply_delay_ms: 3000 }
    }
}

impl Default for ActivityConf {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

impl SimulationConf {
    pub fn apply_delay(&self) -> Duration {
        Duration::from_millis(self.apply_delay_ms)
    }
}

impl AnalysisConf {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid config {path}: {source}")]
    Yaml { path: String, source: serde_yaml::Error },
}

/// Lit le fichier sans retomber sur les défauts ; `None` si absent ou vide
pub async fn read_config(path: &str) -> Result<Option<KernelConfig>, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let txt = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io { path: path.into(), source })?;
    if txt.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str(&txt)
        .map(Some)
        .map_err(|source| ConfigError::Yaml { path: path.into(), source })
}

fn apply_env_overrides(cfg: &mut KernelConfig) {
    if let Ok(endpoint) = std::env::var("ARCHOPT_ANALYSIS_ENDPOINT") {
        cfg.analysis.endpoint = endpoint;
    }
    if let Ok(model) = std::env::var("ARCHOPT_ANALYSIS_MODEL") {
        cfg.analysis.model = model;
    }
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("ARCHOPT_KERNEL_CONFIG").unwrap_or_else(|_| "kernel.yaml".into());
    let mut cfg = match read_config(&path).await {
        Ok(Some(cfg)) => cfg,
        Ok(None) => {
            tracing::info!("no config at {path}, using defaults");
            KernelConfig::default()
        }
        Err(e) => {
            tracing::warn!("{e}; using defaults");
            KernelConfig::default()
        }
    };
    apply_env_overrides(&mut cfg);
    cfg
}
