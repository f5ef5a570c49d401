use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates a PostgreSQL connection pool and makes sure the schema exists.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    init_schema(&pool).await?;
    Ok(pool)
}

/// Idempotent. The CHECK lists must match `Channel` and `FeedbackStatus`.
async fn init_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            content TEXT NOT NULL CHECK (length(btrim(content)) > 0),
            processed_content TEXT,
            channel TEXT NOT NULL DEFAULT 'website' CHECK (channel IN (
                'email', 'whatsapp', 'website', 'widget', 'survey',
                'sms', 'social_media', 'phone', 'other'
            )),
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN (
                'pending', 'processing', 'processed', 'failed', 'archived'
            )),
            customer_name TEXT,
            customer_email TEXT,
            rating SMALLINT CHECK (rating BETWEEN 1 AND 5),
            sentiment_score DOUBLE PRECISION CHECK (sentiment_score BETWEEN -1 AND 1),
            confidence_score DOUBLE PRECISION CHECK (confidence_score BETWEEN 0 AND 1),
            ai_summary JSONB,
            ai_categories JSONB,
            ai_action_items JSONB,
            error_message TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            processed_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS feedback_status_idx ON feedback (status)",
        "CREATE INDEX IF NOT EXISTS feedback_channel_idx ON feedback (channel)",
        "CREATE INDEX IF NOT EXISTS feedback_created_at_idx ON feedback (created_at DESC)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema ready (feedback)");
    Ok(())
}
