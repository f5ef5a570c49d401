use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::pipeline::{AnalysisCache, Orchestrator};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Owns the LLM client and the model router.
    pub orchestrator: Arc<Orchestrator>,
    /// No-op when REDIS_URL is unset.
    pub cache: AnalysisCache,
    pub config: Config,
}
