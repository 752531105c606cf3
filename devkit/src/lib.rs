/*!
# ArchOptimizer DevKit - Stubs et utilitaires pour développement

Bibliothèque facilitant le développement et les tests du kernel avec:
- Service d'analyse simulé (format Gemini generateContent), sans clé ni réseau
- Builders de réponses conformes ou volontairement cassées
- Harness de test
*/

pub mod mock_service;
pub mod response_builders;
pub mod test_utils;

pub use mock_service::{GeminiReply, MockAnalysisServer, RecordedRequest};
pub use response_builders::ResponseBuilder;
pub use test_utils::TestHarness;
