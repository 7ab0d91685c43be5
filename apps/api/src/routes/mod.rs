pub mod candidates;
pub mod health;
pub mod ranking;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate ingestion API
        .route(
            "/api/v1/candidates/parse-sources",
            post(candidates::handle_parse_sources),
        )
        .route(
            "/api/v1/candidates/batch",
            post(candidates::handle_batch_ingest),
        )
        .route(
            "/api/v1/candidates/search",
            post(candidates::handle_search),
        )
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate),
        )
        // Ranking API
        .route("/api/v1/ranking/weights", get(ranking::handle_get_weights))
        .route(
            "/api/v1/ranking/weights/reset",
            post(ranking::handle_reset_weights),
        )
        .route(
            "/api/v1/ranking/feedback",
            post(ranking::handle_submit_feedback),
        )
        .route("/api/v1/ranking/stats", get(ranking::handle_feedback_stats))
        .with_state(state)
}
