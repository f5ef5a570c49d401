mod agents;
mod config;
mod db;
mod errors;
mod feedback;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod routing;
mod state;
mod text;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::feedback::processing::stale_after_secs;
use crate::feedback::store::fail_stale_processing;
use crate::llm_client::LlmClient;
use crate::pipeline::{AnalysisCache, Orchestrator};
use crate::routes::build_router;
use crate::routing::{catalog_with_availability, ModelRouter};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting VoC API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (creates the feedback table on first run)
    let db = create_pool(&config.database_url).await?;

    // Rows left in `processing` by a previous run can never finish; fail them
    // so they can be reprocessed.
    let stale_after = stale_after_secs(config.llm_timeout_secs);
    let released = fail_stale_processing(&db, stale_after, None).await?;
    if released > 0 {
        warn!("Released {released} feedback row(s) stuck in processing");
    }

    // Initialize LLM client and the backends it has keys for
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.openai_api_key.clone(),
        config.llm_timeout_secs,
    )?;
    let catalog = catalog_with_availability(|provider| llm.has_key(provider));
    let router = ModelRouter::new(catalog, config.default_backend.as_deref())?;
    info!("Model router ready (default backend: {})", router.default_backend().name);

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(llm),
        router,
        config.batch_concurrency,
    ));

    // Initialize Redis analysis cache
    let cache = AnalysisCache::new(config.redis_url.as_deref(), config.cache_ttl_secs)?;
    if cache.is_enabled() {
        info!("Analysis cache enabled (ttl {}s)", config.cache_ttl_secs);
    } else {
        info!("REDIS_URL not set, analysis cache disabled");
    }

    // Build app state
    let state = AppState {
        db,
        orchestrator,
        cache,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
