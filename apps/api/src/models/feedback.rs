use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::feedback::models::FeedbackStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub content: String,
    pub processed_content: Option<String>,
    pub channel: String,
    pub status: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub rating: Option<i16>,
    pub sentiment_score: Option<f64>,
    pub confidence_score: Option<f64>,
    pub ai_summary: Option<Value>,
    pub ai_categories: Option<Value>,
    pub ai_action_items: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl FeedbackRow {
    /// Parsed status. The table's CHECK constraint keeps this in range;
    /// anything unexpected reads as `Pending`.
    pub fn status(&self) -> FeedbackStatus {
        self.status.parse().unwrap_or(FeedbackStatus::Pending)
    }
}
