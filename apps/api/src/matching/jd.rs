// Job-description requirements parsing: a skill subset from the reference
// vocabulary, a minimum-experience figure, and a capped keyword list. All
// rule-based; no provider involved.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::profile::heuristic::SKILL_VOCABULARY;

/// What a job description asks for, as far as rules can tell.
#[derive(Debug, Clone, Serialize)]
pub struct JobRequirements {
    /// Vocabulary terms the description mentions, lowercase, sorted.
    pub required_skills: Vec<String>,
    /// Smallest years figure stated, 0 when none is.
    pub min_experience_years: u32,
    /// Distinctive tokens for display, capped.
    pub keywords: Vec<String>,
}

const MAX_KEYWORDS: usize = 15;

static MIN_EXPERIENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?:minimum|min)\s*(\d+)\+?\s*years?").unwrap(),
        Regex::new(r"(\d+)\+?\s*years?\s*(?:of\s*)?(?:experience|exp)").unwrap(),
        Regex::new(r"experience\s*(?:of\s*)?(\d+)\+?\s*years?").unwrap(),
    ]
});

static KEYWORD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z][a-zA-Z\-\.\+]+").unwrap());

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "are", "have", "has", "will", "you",
    "your", "our", "who", "can", "all", "any", "not", "but", "into", "about", "their", "role",
    "job", "work", "working", "team", "company", "candidate", "candidates", "required",
    "requirements", "preferred", "must", "should", "strong", "ability", "years", "year",
    "experience", "skills", "knowledge", "looking", "join", "plus", "etc",
];

pub fn parse_job_requirements(job_description: &str) -> JobRequirements {
    let lowered = job_description.to_lowercase();
    JobRequirements {
        required_skills: spot_required_skills(&lowered),
        min_experience_years: min_experience(&lowered),
        keywords: keywords(&lowered),
    }
}

fn spot_required_skills(lowered: &str) -> Vec<String> {
    let mut skills: Vec<String> = SKILL_VOCABULARY
        .iter()
        .filter(|(needle, _)| lowered.contains(needle))
        .map(|(needle, _)| needle.to_string())
        .collect();
    skills.sort();
    skills
}

/// The smallest figure wins when a description states several ("minimum 3
/// years ... 5+ years preferred" asks for 3).
fn min_experience(lowered: &str) -> u32 {
    let mut figures: Vec<u32> = Vec::new();
    for pattern in MIN_EXPERIENCE_PATTERNS.iter() {
        for caps in pattern.captures_iter(lowered) {
            if let Some(m) = caps.get(1) {
                if let Ok(years) = m.as_str().parse::<u32>() {
                    figures.push(years);
                }
            }
        }
    }
    figures.into_iter().min().unwrap_or(0)
}

fn keywords(lowered: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for token in KEYWORD_TOKEN.find_iter(lowered) {
        let token = token.as_str();
        if token.len() <= 2 || STOP_WORDS.contains(&token) {
            continue;
        }
        if seen.insert(token.to_string()) {
            out.push(token.to_string());
        }
        if out.len() == MAX_KEYWORDS {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_skills_sorted_subset() {
        let requirements =
            parse_job_requirements("We need Python, Docker, and PostgreSQL. Redis is a plus.");
        // "sql" fires inside "postgresql"; containment matching keeps both.
        assert_eq!(
            requirements.required_skills,
            vec!["docker", "postgresql", "python", "redis", "sql"]
        );
    }

    #[test]
    fn test_min_experience_pattern_variants() {
        assert_eq!(parse_job_requirements("minimum 3 years in backend").min_experience_years, 3);
        assert_eq!(parse_job_requirements("5+ years of experience").min_experience_years, 5);
        assert_eq!(parse_job_requirements("experience of 4 years").min_experience_years, 4);
    }

    #[test]
    fn test_min_experience_takes_smallest_figure() {
        let requirements =
            parse_job_requirements("minimum 3 years required, 7+ years of experience preferred");
        assert_eq!(requirements.min_experience_years, 3);
    }

    #[test]
    fn test_no_experience_figure_means_zero() {
        assert_eq!(parse_job_requirements("Backend engineer wanted").min_experience_years, 0);
    }

    #[test]
    fn test_keywords_filtered_deduped_capped() {
        let requirements = parse_job_requirements(
            "Backend backend engineer building scalable microservices with observability tooling",
        );
        // Dedup keeps the first occurrence only.
        let backend_count =
            requirements.keywords.iter().filter(|k| k.as_str() == "backend").count();
        assert_eq!(backend_count, 1);
        assert!(!requirements.keywords.iter().any(|k| k == "with"));
        assert!(requirements.keywords.len() <= MAX_KEYWORDS);
    }

    #[test]
    fn test_keyword_cap() {
        let text =
            ('a'..='z').map(|c| format!("keyword{c}")).collect::<Vec<_>>().join(" ");
        let requirements = parse_job_requirements(&text);
        assert_eq!(requirements.keywords.len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_empty_description() {
        let requirements = parse_job_requirements("");
        assert!(requirements.required_skills.is_empty());
        assert_eq!(requirements.min_experience_years, 0);
        assert!(requirements.keywords.is_empty());
    }
}
