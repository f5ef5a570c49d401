// Analysis pipeline: orchestrator, local summary, Redis report cache and the
// HTTP handlers that expose them.
// All LLM calls go through llm_client; nothing here talks to a provider directly.

pub mod cache;
pub mod handlers;
pub mod orchestrator;
pub mod summary;

pub use cache::AnalysisCache;
pub use orchestrator::{AnalysisReport, Orchestrator};
