//! Aggregates over stored feedback, computed live from the `feedback` table.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::agents::sentiment::POLARITY_THRESHOLD;
use crate::errors::AppError;

pub const DEFAULT_PERIOD_DAYS: i32 = 30;
pub const MAX_PERIOD_DAYS: i32 = 365;
const TOP_CATEGORY_LIMIT: i64 = 5;

#[derive(Debug, FromRow)]
struct TotalsRow {
    total: i64,
    average_sentiment: Option<f64>,
    positive: i64,
    neutral: i64,
    negative: i64,
    needs_attention: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ChannelStats {
    pub channel: String,
    pub count: i64,
    pub average_sentiment: Option<f64>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DailyPoint {
    pub day: NaiveDate,
    pub count: i64,
    pub average_sentiment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    pub positive_pct: f64,
    pub neutral_pct: f64,
    pub negative_pct: f64,
    /// Positive share minus negative share, in −100..=100.
    pub net_sentiment: f64,
}

impl SentimentDistribution {
    pub fn from_counts(positive: i64, neutral: i64, negative: i64) -> Self {
        let scored = positive + neutral + negative;
        let pct = |n: i64| {
            if scored == 0 {
                0.0
            } else {
                round1(n as f64 * 100.0 / scored as f64)
            }
        };
        Self {
            positive,
            neutral,
            negative,
            positive_pct: pct(positive),
            neutral_pct: pct(neutral),
            negative_pct: pct(negative),
            net_sentiment: round1(pct(positive) - pct(negative)),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub period_days: i32,
    pub total: i64,
    pub average_sentiment: Option<f64>,
    /// Processed rows whose summary flagged them for attention.
    pub needs_attention: i64,
    pub sentiment: SentimentDistribution,
    pub by_status: Vec<StatusCount>,
    pub by_channel: Vec<ChannelStats>,
    pub top_categories: Vec<CategoryCount>,
    pub daily_trend: Vec<DailyPoint>,
}

/// Clamps a requested period into 1..=365 days.
pub fn period_days(requested: Option<i32>) -> Result<i32, AppError> {
    match requested {
        None => Ok(DEFAULT_PERIOD_DAYS),
        Some(days) if (1..=MAX_PERIOD_DAYS).contains(&days) => Ok(days),
        Some(days) => Err(AppError::Validation(format!(
            "days must be between 1 and {MAX_PERIOD_DAYS}, got {days}"
        ))),
    }
}

pub async fn summarize(pool: &PgPool, days: i32) -> Result<AnalyticsSummary, AppError> {
    let totals: TotalsRow = sqlx::query_as(
        r#"
        SELECT
            COUNT(*) AS total,
            AVG(sentiment_score) AS average_sentiment,
            COUNT(*) FILTER (WHERE sentiment_score > $2) AS positive,
            COUNT(*) FILTER (WHERE sentiment_score BETWEEN $3 AND $2) AS neutral,
            COUNT(*) FILTER (WHERE sentiment_score < $3) AS negative,
            COUNT(*) FILTER (
                WHERE status = 'processed'
                  AND (ai_summary->>'requires_attention')::boolean
            ) AS needs_attention
        FROM feedback
        WHERE created_at >= NOW() - make_interval(days => $1)
        "#,
    )
    .bind(days)
    .bind(POLARITY_THRESHOLD)
    .bind(-POLARITY_THRESHOLD)
    .fetch_one(pool)
    .await?;

    let by_status: Vec<StatusCount> = sqlx::query_as(
        r#"
        SELECT status, COUNT(*) AS count
        FROM feedback
        WHERE created_at >= NOW() - make_interval(days => $1)
        GROUP BY status
        ORDER BY count DESC
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    let by_channel: Vec<ChannelStats> = sqlx::query_as(
        r#"
        SELECT channel, COUNT(*) AS count, AVG(sentiment_score) AS average_sentiment
        FROM feedback
        WHERE created_at >= NOW() - make_interval(days => $1)
        GROUP BY channel
        ORDER BY count DESC
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    let top_categories: Vec<CategoryCount> = sqlx::query_as(
        r#"
        SELECT ai_categories->>'primary_category' AS category, COUNT(*) AS count
        FROM feedback
        WHERE created_at >= NOW() - make_interval(days => $1)
          AND ai_categories->>'primary_category' IS NOT NULL
        GROUP BY category
        ORDER BY count DESC, category
        LIMIT $2
        "#,
    )
    .bind(days)
    .bind(TOP_CATEGORY_LIMIT)
    .fetch_all(pool)
    .await?;

    let daily_trend: Vec<DailyPoint> = sqlx::query_as(
        r#"
        SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
               COUNT(*) AS count,
               AVG(sentiment_score) AS average_sentiment
        FROM feedback
        WHERE created_at >= NOW() - make_interval(days => $1)
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(days)
    .fetch_all(pool)
    .await?;

    Ok(AnalyticsSummary {
        period_days: days,
        total: totals.total,
        average_sentiment: totals.average_sentiment,
        needs_attention: totals.needs_attention,
        sentiment: SentimentDistribution::from_counts(
            totals.positive,
            totals.neutral,
            totals.negative,
        ),
        by_status,
        by_channel,
        top_categories,
        daily_trend,
    })
}
