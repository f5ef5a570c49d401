use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::analytics::{self, AnalyticsSummary};
use crate::feedback::models::{Channel, FeedbackStatus};
use crate::feedback::processing::{is_stale, process_feedback, spawn_processing, stale_after_secs};
use crate::feedback::store::{self, FeedbackFilter, NewFeedback};
use crate::models::feedback::FeedbackRow;
use crate::pipeline::handlers::validate_text;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
const MAX_NAME_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub content: String,
    #[serde(default)]
    pub channel: Channel,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub rating: Option<i16>,
    /// Start analysis right away. Defaults to true.
    #[serde(default = "default_true")]
    pub process: bool,
}

fn default_true() -> bool {
    true
}

/// Blank optional strings are treated as absent.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_submission(req: &SubmitFeedbackRequest) -> Result<(), AppError> {
    validate_text(&req.content)?;
    if let Some(rating) = req.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
    }
    if let Some(email) = non_blank(&req.customer_email) {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(AppError::Validation(format!("Invalid email address: {email}")));
        }
    }
    if let Some(name) = non_blank(&req.customer_name) {
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::Validation(format!(
                "customer_name is limited to {MAX_NAME_CHARS} characters"
            )));
        }
    }
    Ok(())
}

/// Admin endpoints are disabled unless a token is configured.
pub fn authorize_admin(headers: &HeaderMap, configured: Option<&str>) -> Result<(), AppError> {
    let expected = configured.ok_or(AppError::Forbidden)?;
    let supplied = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;
    if supplied != expected {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// POST /api/v1/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackRow>), AppError> {
    validate_submission(&req)?;

    let row = store::insert_feedback(
        &state.db,
        NewFeedback {
            content: req.content.trim(),
            channel: req.channel,
            customer_name: non_blank(&req.customer_name),
            customer_email: non_blank(&req.customer_email),
            rating: req.rating,
        },
    )
    .await?;

    if req.process {
        spawn_processing(state.db.clone(), Arc::clone(&state.orchestrator), row.id);
    }

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/feedback?channel=&status=&limit=&offset=
pub async fn handle_list_feedback(
    State(state): State<AppState>,
    Query(filter): Query<FeedbackFilter>,
) -> Result<Json<Vec<FeedbackRow>>, AppError> {
    let rows = store::list_feedback(&state.db, &filter).await?;
    Ok(Json(rows))
}

/// GET /api/v1/feedback/:id
pub async fn handle_get_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackRow>, AppError> {
    let row = store::get_feedback(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Feedback {id} not found")))?;
    Ok(Json(row))
}

/// POST /api/v1/feedback/:id/process
/// Runs the pipeline synchronously on a pending or failed row. A row stuck in
/// `processing` past the stale window is failed first, then retried.
pub async fn handle_process_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackRow>, AppError> {
    let window = stale_after_secs(state.config.llm_timeout_secs);
    if let Some(current) = store::get_feedback(&state.db, id).await? {
        if is_stale(&current, Utc::now(), window) {
            let released = store::fail_stale_processing(&state.db, window, Some(id)).await?;
            info!("Released stale processing claim on feedback {id} ({released} row)");
        }
    }

    let row = process_feedback(&state.db, &state.orchestrator, id).await?;
    Ok(Json(row))
}

/// POST /api/v1/feedback/:id/archive
pub async fn handle_archive_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackRow>, AppError> {
    let row = store::transition(&state.db, id, FeedbackStatus::Archived).await?;
    info!("Archived feedback {id}");
    Ok(Json(row))
}

/// DELETE /api/v1/feedback/:id
pub async fn handle_delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    authorize_admin(&headers, state.config.admin_token.as_deref())?;

    if !store::delete_feedback(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Feedback {id} not found")));
    }
    info!("Deleted feedback {id}");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<i32>,
}

/// GET /api/v1/analytics/summary?days=30
pub async fn handle_analytics_summary(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let days = analytics::period_days(query.days)?;
    let summary = analytics::summarize(&state.db, days).await?;
    Ok(Json(summary))
}
