// Adaptive ranking weights driven by recruiter feedback. The engine owns
// the lexical weight triple and a feedback log; adjustment is deliberately
// conservative and fully explainable from the stats it reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// Lexical ranking weights. Every update goes through
/// `clamped_normalized`, so the three always sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub skills: f64,
    pub experience: f64,
    pub summary: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self { skills: 0.50, experience: 0.20, summary: 0.30 }
    }
}

const MIN_WEIGHTS: RankingWeights = RankingWeights { skills: 0.20, experience: 0.05, summary: 0.10 };
const MAX_WEIGHTS: RankingWeights = RankingWeights { skills: 0.80, experience: 0.50, summary: 0.70 };

impl RankingWeights {
    pub fn sum(&self) -> f64 {
        self.skills + self.experience + self.summary
    }

    /// Clamps each component into its allowed band, then rescales so the
    /// three sum to 1. Clamp runs first; the rescale may land a component
    /// slightly outside its band, which is accepted in favour of the
    /// sum-to-1 invariant.
    pub fn clamped_normalized(mut self) -> Self {
        self.skills = self.skills.clamp(MIN_WEIGHTS.skills, MAX_WEIGHTS.skills);
        self.experience = self.experience.clamp(MIN_WEIGHTS.experience, MAX_WEIGHTS.experience);
        self.summary = self.summary.clamp(MIN_WEIGHTS.summary, MAX_WEIGHTS.summary);

        let total = self.sum();
        if total > 0.0 {
            self.skills /= total;
            self.experience /= total;
            self.summary /= total;
        }
        self
    }
}

/// One recruiter verdict on a scored match.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub candidate_id: String,
    pub job_id: String,
    pub recruiter_id: String,
    pub is_relevant: bool,
    pub predicted_score: f64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackStats {
    pub total_feedback: usize,
    pub relevant_count: usize,
    pub irrelevant_count: usize,
    /// Share of matches the recruiters accepted.
    pub accuracy: f64,
    pub avg_predicted_score_relevant: f64,
    pub avg_predicted_score_irrelevant: f64,
    pub period_days: i64,
}

/// What an adjustment attempt did, reported verbatim to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdjustmentOutcome {
    Skipped { reason: String, feedback_count: usize, min_required: usize },
    Adjusted {
        feedback_count: usize,
        accuracy: f64,
        previous_weights: RankingWeights,
        new_weights: RankingWeights,
    },
}

/// Feedback volume below which no automatic adjustment runs.
const MIN_FEEDBACK_FOR_ADJUSTMENT: usize = 5;
/// Irrelevant matches averaging above this predicted score indicate the
/// scorer is overconfident.
const OVERCONFIDENCE_THRESHOLD: f64 = 0.6;
const ADJUSTMENT_STEP: f64 = 0.02;
/// Stats window consulted by automatic adjustment.
const ADJUSTMENT_WINDOW_DAYS: i64 = 30;

#[derive(Default)]
pub struct AdaptiveRankingEngine {
    weights: RwLock<RankingWeights>,
    feedback: RwLock<Vec<FeedbackRecord>>,
}

impl AdaptiveRankingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current_weights(&self) -> RankingWeights {
        *self.weights.read().await
    }

    /// Stores one verdict, then attempts an automatic adjustment.
    pub async fn record_feedback(&self, record: FeedbackRecord) -> AdjustmentOutcome {
        self.feedback.write().await.push(record);
        self.adjust_from_feedback().await
    }

    /// Re-derives weights from recent feedback. Requires a minimum volume;
    /// below it nothing changes and the caller is told why.
    pub async fn adjust_from_feedback(&self) -> AdjustmentOutcome {
        let stats = self.stats(None, ADJUSTMENT_WINDOW_DAYS).await;
        if stats.total_feedback < MIN_FEEDBACK_FOR_ADJUSTMENT {
            return AdjustmentOutcome::Skipped {
                reason: "not enough feedback to adjust".to_string(),
                feedback_count: stats.total_feedback,
                min_required: MIN_FEEDBACK_FOR_ADJUSTMENT,
            };
        }

        let mut weights = self.weights.write().await;
        let previous = *weights;
        let mut adjusted = previous;

        // Overconfident on rejected matches: pull every component back and
        // let normalization redistribute.
        if stats.irrelevant_count > 0
            && stats.avg_predicted_score_irrelevant > OVERCONFIDENCE_THRESHOLD
        {
            adjusted.skills -= ADJUSTMENT_STEP;
            adjusted.experience -= ADJUSTMENT_STEP;
            adjusted.summary -= ADJUSTMENT_STEP;
        }

        let new_weights = adjusted.clamped_normalized();
        *weights = new_weights;

        if new_weights != previous {
            info!(
                accuracy = stats.accuracy,
                feedback = stats.total_feedback,
                "ranking weights adjusted"
            );
        }

        AdjustmentOutcome::Adjusted {
            feedback_count: stats.total_feedback,
            accuracy: stats.accuracy,
            previous_weights: previous,
            new_weights,
        }
    }

    pub async fn reset_weights(&self) -> RankingWeights {
        let mut weights = self.weights.write().await;
        *weights = RankingWeights::default();
        info!("ranking weights reset to defaults");
        *weights
    }

    /// Aggregates over the feedback window, optionally narrowed to one
    /// recruiter.
    pub async fn stats(&self, recruiter_id: Option<&str>, days: i64) -> FeedbackStats {
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let feedback = self.feedback.read().await;
        let window: Vec<&FeedbackRecord> = feedback
            .iter()
            .filter(|record| record.created_at >= cutoff)
            .filter(|record| recruiter_id.map_or(true, |id| record.recruiter_id == id))
            .collect();

        let total = window.len();
        let relevant: Vec<f64> =
            window.iter().filter(|r| r.is_relevant).map(|r| r.predicted_score).collect();
        let irrelevant: Vec<f64> =
            window.iter().filter(|r| !r.is_relevant).map(|r| r.predicted_score).collect();

        FeedbackStats {
            total_feedback: total,
            relevant_count: relevant.len(),
            irrelevant_count: irrelevant.len(),
            accuracy: if total == 0 { 0.0 } else { relevant.len() as f64 / total as f64 },
            avg_predicted_score_relevant: mean(&relevant),
            avg_predicted_score_irrelevant: mean(&irrelevant),
            period_days: days,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
