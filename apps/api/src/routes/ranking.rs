use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::weights::{
    AdjustmentOutcome, FeedbackRecord, FeedbackStats, RankingWeights,
};
use crate::state::AppState;

const DEFAULT_STATS_DAYS: i64 = 30;
const MAX_STATS_DAYS: i64 = 365;

#[derive(Serialize)]
pub struct WeightsResponse {
    pub weights: RankingWeights,
    pub defaults: RankingWeights,
}

#[derive(Deserialize)]
pub struct FeedbackSubmission {
    pub candidate_id: String,
    pub job_id: String,
    pub recruiter_id: String,
    pub is_relevant: bool,
    pub predicted_score: f64,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct FeedbackResponse {
    pub status: &'static str,
    pub feedback: FeedbackRecord,
    pub adjustment: AdjustmentOutcome,
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub recruiter_id: Option<String>,
    pub days: Option<i64>,
}

/// GET /api/v1/ranking/weights
pub async fn handle_get_weights(State(state): State<AppState>) -> Json<WeightsResponse> {
    Json(WeightsResponse {
        weights: state.ranking.current_weights().await,
        defaults: RankingWeights::default(),
    })
}

/// POST /api/v1/ranking/weights/reset
pub async fn handle_reset_weights(State(state): State<AppState>) -> Json<WeightsResponse> {
    Json(WeightsResponse {
        weights: state.ranking.reset_weights().await,
        defaults: RankingWeights::default(),
    })
}

/// POST /api/v1/ranking/feedback
/// Records one relevance judgement and may nudge the ranking weights.
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackSubmission>,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    for (field, value) in [
        ("candidate_id", &req.candidate_id),
        ("job_id", &req.job_id),
        ("recruiter_id", &req.recruiter_id),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("'{field}' must not be empty")));
        }
    }
    if !req.predicted_score.is_finite() || !(0.0..=1.0).contains(&req.predicted_score) {
        return Err(AppError::Validation(
            "'predicted_score' must be between 0.0 and 1.0".to_string(),
        ));
    }

    let record = FeedbackRecord {
        candidate_id: req.candidate_id.trim().to_string(),
        job_id: req.job_id.trim().to_string(),
        recruiter_id: req.recruiter_id.trim().to_string(),
        is_relevant: req.is_relevant,
        predicted_score: req.predicted_score,
        reason: req.reason.map(|r| r.trim().to_string()).unwrap_or_default(),
        created_at: chrono::Utc::now(),
    };

    let adjustment = state.ranking.record_feedback(record.clone()).await;
    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse { status: "success", feedback: record, adjustment }),
    ))
}

/// GET /api/v1/ranking/stats
pub async fn handle_feedback_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<FeedbackStats>, AppError> {
    let days = params.days.unwrap_or(DEFAULT_STATS_DAYS);
    if !(1..=MAX_STATS_DAYS).contains(&days) {
        return Err(AppError::Validation(format!(
            "'days' must be between 1 and {MAX_STATS_DAYS}"
        )));
    }

    let stats = state.ranking.stats(params.recruiter_id.as_deref(), days).await;
    Ok(Json(stats))
}
