/**
 * ARCHOPT KERNEL - Bibliothèque du serveur ArchOptimizer
 *
 * RÔLE : Modèle du graphe, client d'analyse, cycle de vie des propositions,
 * journal d'activité et contrôleur de session exposé en HTTP.
 */

pub mod activity;
pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod graph;
pub mod health;
pub mod http;
pub mod proposals;
pub mod report;
pub mod seed;
pub mod session;

pub use analysis::{AnalysisError, AnalysisResult, AnalysisService, GeminiClient};
pub use dashboard::{ApplyOutcome, Dashboard, RunOutcome};
pub use graph::{Graph, GraphError};
pub use session::Session;
