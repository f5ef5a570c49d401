pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::feedback::handlers as feedback;
use crate::pipeline::handlers as pipeline;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless analysis
        .route("/api/v1/analyze", post(pipeline::handle_analyze))
        .route("/api/v1/analyze/batch", post(pipeline::handle_analyze_batch))
        .route("/api/v1/route", post(pipeline::handle_route_preview))
        .route("/api/v1/models", get(pipeline::handle_list_models))
        // Stored feedback
        .route(
            "/api/v1/feedback",
            post(feedback::handle_submit_feedback).get(feedback::handle_list_feedback),
        )
        .route(
            "/api/v1/feedback/:id",
            get(feedback::handle_get_feedback).delete(feedback::handle_delete_feedback),
        )
        .route(
            "/api/v1/feedback/:id/process",
            post(feedback::handle_process_feedback),
        )
        .route(
            "/api/v1/feedback/:id/archive",
            post(feedback::handle_archive_feedback),
        )
        .route(
            "/api/v1/analytics/summary",
            get(feedback::handle_analytics_summary),
        )
        .with_state(state)
}
