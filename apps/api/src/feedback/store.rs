//! SQL access to the `feedback` table.
//!
//! Status changes go through conditional UPDATEs (`WHERE status = ANY(...)`)
//! built from `FeedbackStatus::predecessors`, so two workers can never both
//! claim a row and a processed row can never be reopened.

use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::models::{Channel, FeedbackStatus};
use crate::models::feedback::FeedbackRow;
use crate::pipeline::AnalysisReport;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;
pub const STALE_PROCESSING_MESSAGE: &str = "processing interrupted before completion";

/// Fields accepted when a new row is submitted.
pub struct NewFeedback<'a> {
    pub content: &'a str,
    pub channel: Channel,
    pub customer_name: Option<&'a str>,
    pub customer_email: Option<&'a str>,
    pub rating: Option<i16>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackFilter {
    pub channel: Option<Channel>,
    pub status: Option<FeedbackStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FeedbackFilter {
    /// Page size and offset with defaults and bounds applied.
    pub fn page(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

pub async fn insert_feedback(pool: &PgPool, new: NewFeedback<'_>) -> Result<FeedbackRow, AppError> {
    let row: FeedbackRow = sqlx::query_as(
        r#"
        INSERT INTO feedback (content, channel, status, customer_name, customer_email, rating)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(new.content)
    .bind(new.channel.as_str())
    .bind(FeedbackStatus::Pending.as_str())
    .bind(new.customer_name)
    .bind(new.customer_email)
    .bind(new.rating)
    .fetch_one(pool)
    .await?;

    info!("Stored feedback {} from {}", row.id, row.channel);
    Ok(row)
}

pub async fn get_feedback(pool: &PgPool, id: Uuid) -> Result<Option<FeedbackRow>, AppError> {
    let row = sqlx::query_as("SELECT * FROM feedback WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_feedback(
    pool: &PgPool,
    filter: &FeedbackFilter,
) -> Result<Vec<FeedbackRow>, AppError> {
    let (limit, offset) = filter.page();
    let rows = sqlx::query_as(
        r#"
        SELECT * FROM feedback
        WHERE ($1::text IS NULL OR channel = $1)
          AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(filter.channel.map(|c| c.as_str()))
    .bind(filter.status.map(|s| s.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Moves a row to `to` if its current status allows it.
/// Returns `Conflict` for a disallowed move and `NotFound` for a missing row.
pub async fn transition(
    pool: &PgPool,
    id: Uuid,
    to: FeedbackStatus,
) -> Result<FeedbackRow, AppError> {
    let allowed: Vec<String> = to
        .predecessors()
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();

    let updated: Option<FeedbackRow> = sqlx::query_as(
        r#"
        UPDATE feedback
        SET status = $1, updated_at = NOW()
        WHERE id = $2 AND status = ANY($3)
        RETURNING *
        "#,
    )
    .bind(to.as_str())
    .bind(id)
    .bind(&allowed)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(row) => Ok(row),
        None => Err(rejected_transition(pool, id, to).await),
    }
}

async fn rejected_transition(pool: &PgPool, id: Uuid, to: FeedbackStatus) -> AppError {
    match get_feedback(pool, id).await {
        Ok(Some(row)) => AppError::Conflict(format!(
            "Feedback {id} cannot move from {} to {to}",
            row.status
        )),
        Ok(None) => AppError::NotFound(format!("Feedback {id} not found")),
        Err(e) => e,
    }
}

/// Writes a finished analysis onto a row that is currently `processing`.
pub async fn store_analysis(
    pool: &PgPool,
    id: Uuid,
    report: &AnalysisReport,
) -> Result<FeedbackRow, AppError> {
    let summary = serde_json::to_value(&report.summary).map_err(anyhow::Error::from)?;
    let categories = serde_json::to_value(&report.categorization).map_err(anyhow::Error::from)?;
    let actions = serde_json::to_value(&report.suggested_actions).map_err(anyhow::Error::from)?;
    // Partial reports are still stored; the failed stages are kept for review.
    let stage_errors = (!report.is_complete()).then(|| describe_stage_errors(report));

    let updated: Option<FeedbackRow> = sqlx::query_as(
        r#"
        UPDATE feedback
        SET status = $1,
            processed_content = $2,
            sentiment_score = $3,
            confidence_score = $4,
            ai_summary = $5,
            ai_categories = $6,
            ai_action_items = $7,
            error_message = $8,
            processed_at = NOW(),
            updated_at = NOW()
        WHERE id = $9 AND status = $10
        RETURNING *
        "#,
    )
    .bind(FeedbackStatus::Processed.as_str())
    .bind(&report.processed_text)
    .bind(report.sentiment.sentiment_score)
    .bind(report.sentiment.confidence)
    .bind(summary)
    .bind(categories)
    .bind(actions)
    .bind(stage_errors)
    .bind(id)
    .bind(FeedbackStatus::Processing.as_str())
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(row) => Ok(row),
        None => Err(rejected_transition(pool, id, FeedbackStatus::Processed).await),
    }
}

pub async fn mark_failed(pool: &PgPool, id: Uuid, message: &str) -> Result<FeedbackRow, AppError> {
    let updated: Option<FeedbackRow> = sqlx::query_as(
        r#"
        UPDATE feedback
        SET status = $1, error_message = $2, updated_at = NOW()
        WHERE id = $3 AND status = $4
        RETURNING *
        "#,
    )
    .bind(FeedbackStatus::Failed.as_str())
    .bind(message)
    .bind(id)
    .bind(FeedbackStatus::Processing.as_str())
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(row) => Ok(row),
        None => Err(rejected_transition(pool, id, FeedbackStatus::Failed).await),
    }
}

/// Fails rows left in `processing` longer than `stale_after_secs`, e.g. by a
/// restart mid-analysis. Limited to one row when `id` is given.
/// Returns the number of rows released.
pub async fn fail_stale_processing(
    pool: &PgPool,
    stale_after_secs: i64,
    id: Option<Uuid>,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE feedback
        SET status = $1, error_message = $2, updated_at = NOW()
        WHERE status = $3
          AND updated_at < NOW() - make_interval(secs => $4)
          AND ($5::uuid IS NULL OR id = $5)
        "#,
    )
    .bind(FeedbackStatus::Failed.as_str())
    .bind(STALE_PROCESSING_MESSAGE)
    .bind(FeedbackStatus::Processing.as_str())
    .bind(stale_after_secs as f64)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Returns false when no row had that id.
pub async fn delete_feedback(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// "sentiment: timeout; topic: bad json"
pub fn describe_stage_errors(report: &AnalysisReport) -> String {
    report
        .errors
        .iter()
        .map(|e| format!("{}: {}", e.agent.as_str(), e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
