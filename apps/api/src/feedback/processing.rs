//! Runs stored feedback through the analysis pipeline.
//!
//! pending/failed → processing (claim) → orchestrator → processed | failed.
//! The claim is a conditional UPDATE, so a row already taken by another
//! worker comes back as `Conflict` and is skipped.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::models::FeedbackStatus;
use crate::feedback::store;
use crate::models::feedback::FeedbackRow;
use crate::pipeline::Orchestrator;
use crate::routing::committee::Priority;
use crate::routing::TaskContext;

const AGENT_CALLS: i64 = 3;
const ATTEMPTS_PER_CALL: i64 = 3;
/// 1s + 2s between attempts.
const BACKOFF_SECS_PER_CALL: i64 = 3;
const STALE_MARGIN_SECS: i64 = 60;

/// Longest a healthy run can hold a row in `processing`: every agent call
/// timing out on every attempt, plus a margin.
pub fn stale_after_secs(llm_timeout_secs: u64) -> i64 {
    let timeout = i64::try_from(llm_timeout_secs).unwrap_or(i64::MAX);
    timeout
        .saturating_mul(ATTEMPTS_PER_CALL)
        .saturating_add(BACKOFF_SECS_PER_CALL)
        .saturating_mul(AGENT_CALLS)
        .saturating_add(STALE_MARGIN_SECS)
}

/// Same condition `store::fail_stale_processing` applies in SQL.
pub fn is_stale(row: &FeedbackRow, now: DateTime<Utc>, stale_after_secs: i64) -> bool {
    row.status() == FeedbackStatus::Processing
        && now - row.updated_at > Duration::seconds(stale_after_secs)
}

/// Low star ratings are routed as high priority.
pub fn context_for(row: &FeedbackRow) -> TaskContext {
    let priority = match row.rating {
        Some(1) | Some(2) => Priority::High,
        _ => Priority::Normal,
    };
    TaskContext {
        priority,
        volume: 1,
        ..TaskContext::default()
    }
}

pub async fn process_feedback(
    pool: &PgPool,
    orchestrator: &Orchestrator,
    id: Uuid,
) -> Result<FeedbackRow, AppError> {
    let row = store::transition(pool, id, FeedbackStatus::Processing).await?;
    info!("Processing feedback {id}");

    let report = orchestrator.analyze(&row.content, &context_for(&row)).await;

    if report.all_stages_failed() {
        let message = store::describe_stage_errors(&report);
        warn!("Every stage failed for feedback {id}: {message}");
        return store::mark_failed(pool, id, &message).await;
    }

    match store::store_analysis(pool, id, &report).await {
        Ok(row) => {
            info!(
                "Feedback {id} processed: {:?} ({:.2})",
                report.summary.sentiment_label, report.summary.sentiment_score
            );
            Ok(row)
        }
        Err(e) => {
            // Don't leave the row stuck in `processing`.
            if let Err(mark_err) = store::mark_failed(pool, id, &e.to_string()).await {
                error!("Could not mark feedback {id} as failed: {mark_err}");
            }
            Err(e)
        }
    }
}

/// Processes a row on a detached task. Errors are logged, never returned.
pub fn spawn_processing(
    pool: PgPool,
    orchestrator: Arc<Orchestrator>,
    id: Uuid,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match process_feedback(&pool, &orchestrator, id).await {
            Ok(row) => debug!("Background processing of {id} finished as {}", row.status()),
            Err(AppError::Conflict(msg)) => debug!("Skipping feedback {id}: {msg}"),
            Err(e) => error!("Background processing of {id} failed: {e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row_with_rating(rating: Option<i16>) -> FeedbackRow {
        FeedbackRow {
            id: Uuid::new_v4(),
            content: "الخدمة سيئة".to_string(),
            processed_content: None,
            channel: "website".to_string(),
            status: "pending".to_string(),
            customer_name: None,
            customer_email: None,
            rating,
            sentiment_score: None,
            confidence_score: None,
            ai_summary: None,
            ai_categories: None,
            ai_action_items: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            processed_at: None,
        }
    }

    #[test]
    fn test_low_ratings_raise_priority() {
        assert_eq!(context_for(&row_with_rating(Some(1))).priority, Priority::High);
        assert_eq!(context_for(&row_with_rating(Some(2))).priority, Priority::High);
        assert_eq!(context_for(&row_with_rating(Some(3))).priority, Priority::Normal);
        assert_eq!(context_for(&row_with_rating(None)).priority, Priority::Normal);
    }

    #[test]
    fn test_context_is_single_item() {
        let ctx = context_for(&row_with_rating(Some(5)));
        assert_eq!(ctx.volume, 1);
        assert_eq!(ctx.cost_preference, TaskContext::default().cost_preference);
    }

    fn row_in(status: &str, idle_secs: i64) -> FeedbackRow {
        FeedbackRow {
            status: status.to_string(),
            updated_at: Utc::now() - Duration::seconds(idle_secs),
            ..row_with_rating(None)
        }
    }

    #[test]
    fn test_stale_window_covers_every_retry() {
        // 3 calls × (3 attempts × 60s + 3s backoff) + 60s margin
        assert_eq!(stale_after_secs(60), 3 * (3 * 60 + 3) + 60);
        assert!(stale_after_secs(1) > 3 * 3);
    }

    #[test]
    fn test_long_idle_processing_row_is_stale() {
        let window = stale_after_secs(10);
        assert!(is_stale(&row_in("processing", window + 5), Utc::now(), window));
    }

    #[test]
    fn test_recent_processing_row_is_not_stale() {
        let window = stale_after_secs(10);
        assert!(!is_stale(&row_in("processing", 5), Utc::now(), window));
    }

    #[test]
    fn test_only_processing_rows_go_stale() {
        let window = stale_after_secs(10);
        for status in ["pending", "processed", "failed", "archived"] {
            assert!(!is_stale(&row_in(status, window * 10), Utc::now(), window));
        }
    }

    #[test]
    fn test_row_status_parses() {
        assert_eq!(row_with_rating(None).status(), FeedbackStatus::Pending);
    }
}
