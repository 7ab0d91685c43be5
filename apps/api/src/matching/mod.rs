// Candidate/job matching. Combines independent sub-scores into one figure
// with documented weights; the reasoning lines are derived strictly from the
// computed numbers, never generated.

pub mod jd;
pub mod weights;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::matching::jd::{parse_job_requirements, JobRequirements};
use crate::matching::weights::RankingWeights;
use crate::models::candidate::CandidateProfile;

/// Weight share the semantic sub-score takes when an embedding pair exists.
/// The lexical weights scale into the remainder, so the layout sums to 1
/// either way.
pub const SEMANTIC_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub candidate_id: Uuid,
    pub job_description_hash: String,
    /// Weighted combination of the breakdown, always in [0, 1].
    pub overall_score: f64,
    /// Sub-scores actually computed. A sub-score that could not be computed
    /// is absent here, never reported as zero.
    pub breakdown: BTreeMap<String, f64>,
    pub reasoning: Vec<String>,
}

/// Scores one candidate against a job description.
///
/// `semantic_similarity` is `None` whenever no embedding pair was available;
/// passing `Some(0.0)` means the embeddings really were orthogonal, and the
/// two cases produce different results.
pub fn score(
    profile: &CandidateProfile,
    job_description: &str,
    semantic_similarity: Option<f64>,
    lexical: RankingWeights,
) -> MatchResult {
    let requirements = parse_job_requirements(job_description);

    let (skills, matched_skills) = skills_score(&profile.skills, &requirements.required_skills);
    let experience =
        experience_score(profile.experience_years, requirements.min_experience_years);
    let summary = summary_similarity(&profile.professional_summary, job_description);

    let (w_skills, w_experience, w_summary) = match semantic_similarity {
        Some(_) => (
            lexical.skills * (1.0 - SEMANTIC_WEIGHT),
            lexical.experience * (1.0 - SEMANTIC_WEIGHT),
            lexical.summary * (1.0 - SEMANTIC_WEIGHT),
        ),
        None => (lexical.skills, lexical.experience, lexical.summary),
    };

    let mut overall = skills * w_skills + experience * w_experience + summary * w_summary;
    if let Some(semantic) = semantic_similarity {
        overall += semantic * SEMANTIC_WEIGHT;
    }

    let mut breakdown = BTreeMap::new();
    breakdown.insert("skills_score".to_string(), round4(skills));
    breakdown.insert("experience_score".to_string(), round4(experience));
    breakdown.insert("summary_similarity".to_string(), round4(summary));
    if let Some(semantic) = semantic_similarity {
        breakdown.insert("semantic_score".to_string(), round4(semantic));
    }

    let reasoning = build_reasoning(
        &requirements,
        &matched_skills,
        profile.experience_years,
        experience,
        summary,
        semantic_similarity,
    );

    MatchResult {
        candidate_id: profile.id,
        job_description_hash: hash_job_description(job_description),
        overall_score: round4(overall.clamp(0.0, 1.0)),
        breakdown,
        reasoning,
    }
}

/// Matched share of the required skills, plus the matched terms themselves.
/// Case-insensitive exact term comparison; an empty requirement list scores 0.
pub fn skills_score(candidate_skills: &[String], required: &[String]) -> (f64, Vec<String>) {
    if required.is_empty() {
        return (0.0, Vec::new());
    }
    let have: HashSet<String> = candidate_skills.iter().map(|s| s.to_lowercase()).collect();
    let matched: Vec<String> =
        required.iter().filter(|skill| have.contains(&skill.to_lowercase())).cloned().collect();
    (matched.len() as f64 / required.len() as f64, matched)
}

/// Linear ramp toward the stated minimum, capped at 1. Years beyond the
/// minimum earn nothing extra, and no stated minimum scores 1 outright.
pub fn experience_score(candidate_years: u32, target_years: u32) -> f64 {
    if target_years == 0 {
        return 1.0;
    }
    (candidate_years as f64 / target_years as f64).min(1.0)
}

/// Jaccard overlap between the token sets of the summary and the
/// description.
pub fn summary_similarity(summary: &str, job_description: &str) -> f64 {
    let a = token_set(summary);
    let b = token_set(job_description);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    intersection / union
}

fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(str::to_string)
        .collect()
}

fn build_reasoning(
    requirements: &JobRequirements,
    matched_skills: &[String],
    candidate_years: u32,
    experience: f64,
    summary: f64,
    semantic: Option<f64>,
) -> Vec<String> {
    let mut reasoning = Vec::new();

    if requirements.required_skills.is_empty() {
        reasoning
            .push("Job description names no known skills; skills score is 0.00.".to_string());
    } else if matched_skills.is_empty() {
        reasoning.push(format!(
            "No overlap with the {} skill(s) the job description asks for.",
            requirements.required_skills.len()
        ));
    } else {
        reasoning.push(format!(
            "Matched {}/{} required skills: {}.",
            matched_skills.len(),
            requirements.required_skills.len(),
            matched_skills.join(", ")
        ));
    }

    if requirements.min_experience_years == 0 {
        reasoning.push(format!(
            "No minimum experience stated; {candidate_years} year(s) count in full (score 1.00)."
        ));
    } else {
        reasoning.push(format!(
            "{candidate_years} year(s) against a {}-year minimum (score {experience:.2}).",
            requirements.min_experience_years
        ));
    }

    reasoning.push(format!("Summary token overlap with the description: {summary:.2}."));

    if let Some(semantic) = semantic {
        reasoning.push(format!(
            "Embedding similarity between candidate and description: {semantic:.2}."
        ));
    }

    reasoning
}

fn hash_job_description(job_description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(job_description.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_profile(skills: &[&str], years: u32, summary: &str) -> CandidateProfile {
        CandidateProfile {
            id: Uuid::new_v4(),
            tenant_id: "tenant-a".to_string(),
            name: "Jane Doe".to_string(),
            email: None,
            phone: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: years,
            education: String::new(),
            professional_summary: summary.to_string(),
            current_role: String::new(),
            location: String::new(),
            source_tags: vec![crate::sources::SourceKind::Pdf],
            degraded: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_skills_score_ratios() {
        let candidate = vec!["Python".to_string(), "Docker".to_string()];

        let (full, matched) =
            skills_score(&candidate, &["python".to_string(), "docker".to_string()]);
        assert!((full - 1.0).abs() < 1e-9);
        assert_eq!(matched, vec!["python", "docker"]);

        let (half, _) = skills_score(&candidate, &["python".to_string(), "redis".to_string()]);
        assert!((half - 0.5).abs() < 1e-9);

        let (none, matched) = skills_score(&candidate, &["rust".to_string()]);
        assert_eq!(none, 0.0);
        assert!(matched.is_empty());

        let (empty, _) = skills_score(&candidate, &[]);
        assert_eq!(empty, 0.0);
    }

    #[test]
    fn test_experience_ramp() {
        assert_eq!(experience_score(3, 6), 0.5);
        assert_eq!(experience_score(6, 6), 1.0);
        // No extra credit beyond the minimum.
        assert_eq!(experience_score(12, 6), 1.0);
        // No stated minimum means anyone qualifies.
        assert_eq!(experience_score(0, 0), 1.0);
        assert_eq!(experience_score(0, 5), 0.0);
    }

    #[test]
    fn test_summary_similarity_bounds() {
        assert!(
            (summary_similarity("senior backend engineer", "senior backend engineer") - 1.0)
                .abs()
                < 1e-9
        );
        assert_eq!(summary_similarity("completely different words", "unrelated phrasing here"), 0.0);
        assert_eq!(summary_similarity("", "anything at all"), 0.0);
    }

    #[test]
    fn test_score_without_semantic_uses_lexical_weights_directly() {
        let profile = make_profile(&["Python", "Docker"], 6, "Builds Python APIs");
        let jd = "Python developer. minimum 3 years experience required.";

        let result = score(&profile, jd, None, RankingWeights::default());

        assert!(!result.breakdown.contains_key("semantic_score"));
        assert_eq!(result.breakdown.len(), 3);
        // skills 1.0, experience 1.0, summary 1/8.
        assert!((result.breakdown["skills_score"] - 1.0).abs() < 1e-9);
        assert!((result.breakdown["experience_score"] - 1.0).abs() < 1e-9);
        assert!((result.breakdown["summary_similarity"] - 0.125).abs() < 1e-9);
        assert!((result.overall_score - 0.7375).abs() < 1e-9);
    }

    #[test]
    fn test_semantic_zero_differs_from_semantic_absent() {
        let profile = make_profile(&["Python"], 4, "Python services");
        let jd = "We need Python.";

        let absent = score(&profile, jd, None, RankingWeights::default());
        let zero = score(&profile, jd, Some(0.0), RankingWeights::default());

        assert!(!absent.breakdown.contains_key("semantic_score"));
        assert_eq!(zero.breakdown["semantic_score"], 0.0);
        // A real zero drags the composite down; absence renormalizes instead.
        assert!(zero.overall_score < absent.overall_score);
    }

    #[test]
    fn test_score_with_semantic_share() {
        let profile = make_profile(&["Python", "Docker"], 6, "Builds Python APIs");
        let jd = "Python developer. minimum 3 years experience required.";

        let result = score(&profile, jd, Some(0.8), RankingWeights::default());

        assert_eq!(result.breakdown.len(), 4);
        assert!((result.breakdown["semantic_score"] - 0.8).abs() < 1e-9);
        // 0.75 * 0.7375 + 0.25 * 0.8
        assert!((result.overall_score - 0.7531).abs() < 1e-9);
    }

    #[test]
    fn test_overall_score_stays_in_unit_interval() {
        let strong = make_profile(&["Python", "Docker", "Redis"], 20, "Python Docker Redis");
        let weak = make_profile(&[], 0, "");
        let jd = "Python, Docker and Redis. minimum 2 years experience.";

        for profile in [&strong, &weak] {
            for semantic in [None, Some(0.0), Some(1.0)] {
                let result = score(profile, jd, semantic, RankingWeights::default());
                assert!((0.0..=1.0).contains(&result.overall_score));
            }
        }
    }

    #[test]
    fn test_reasoning_matches_breakdown() {
        let profile = make_profile(&["Python"], 2, "Python work");
        let jd = "Python and Docker. minimum 4 years experience.";

        let without = score(&profile, jd, None, RankingWeights::default());
        assert_eq!(without.reasoning.len(), without.breakdown.len());
        assert!(without.reasoning[0].contains("1/2"));
        assert!(without.reasoning[0].contains("python"));
        assert!(without.reasoning[1].contains("4-year"));

        let with = score(&profile, jd, Some(0.9), RankingWeights::default());
        assert_eq!(with.reasoning.len(), with.breakdown.len());
        assert!(with.reasoning[3].contains("0.90"));
    }

    #[test]
    fn test_job_description_hash_is_stable() {
        let a = hash_job_description("Python developer");
        let b = hash_job_description("Python developer");
        let c = hash_job_description("Rust developer");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
