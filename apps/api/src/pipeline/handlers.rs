use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::pipeline::cache::AnalysisCache;
use crate::pipeline::orchestrator::AnalysisReport;
use crate::routing::{ModelBackend, RoutingDecision, TaskContext};
use crate::state::AppState;
use crate::text::normalize_arabic;

pub const MAX_TEXT_CHARS: usize = 5_000;
pub const MAX_BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(default)]
    pub context: TaskContext,
}

#[derive(Debug, Deserialize)]
pub struct BatchAnalyzeRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub context: TaskContext,
}

#[derive(Debug, Serialize)]
pub struct BatchAnalyzeResponse {
    pub total: usize,
    /// Reports with at least one failed stage.
    pub partial: usize,
    pub results: Vec<AnalysisReport>,
}

/// Rejects blank or oversized feedback text.
pub fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("Text must not be empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "Text is {chars} characters; the limit is {MAX_TEXT_CHARS}"
        )));
    }
    Ok(())
}

fn validate_batch(texts: &[String]) -> Result<(), AppError> {
    if texts.is_empty() {
        return Err(AppError::Validation("Batch must not be empty".to_string()));
    }
    if texts.len() > MAX_BATCH_SIZE {
        return Err(AppError::Validation(format!(
            "Batch holds {} texts; the limit is {MAX_BATCH_SIZE}",
            texts.len()
        )));
    }
    for (i, text) in texts.iter().enumerate() {
        validate_text(text).map_err(|e| AppError::Validation(format!("Item {i}: {e}")))?;
    }
    Ok(())
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    validate_text(&req.text)?;

    let key = AnalysisCache::key_for(&normalize_arabic(&req.text), &req.context);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let report = state.orchestrator.analyze(&req.text, &req.context).await;
    state.cache.put(&key, &report).await;
    Ok(Json(report))
}

/// POST /api/v1/analyze/batch
pub async fn handle_analyze_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchAnalyzeRequest>,
) -> Result<Json<BatchAnalyzeResponse>, AppError> {
    validate_batch(&req.texts)?;

    let results = state
        .orchestrator
        .analyze_batch(req.texts, &req.context)
        .await;
    let partial = results.iter().filter(|r| !r.is_complete()).count();

    Ok(Json(BatchAnalyzeResponse {
        total: results.len(),
        partial,
        results,
    }))
}

/// POST /api/v1/route
/// Shows which backend the committee would pick, without calling it.
pub async fn handle_route_preview(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<RoutingDecision>, AppError> {
    validate_text(&req.text)?;
    let decision = state
        .orchestrator
        .router()
        .route(&normalize_arabic(&req.text), &req.context);
    Ok(Json(decision))
}

/// GET /api/v1/models
pub async fn handle_list_models(State(state): State<AppState>) -> Json<Vec<ModelBackend>> {
    Json(state.orchestrator.router().backends().to_vec())
}
