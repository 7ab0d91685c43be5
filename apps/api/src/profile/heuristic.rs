// Deterministic structuring fallback. No provider and no randomness: the
// same text always yields the same field values, so degraded ingestions stay
// reproducible.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::models::candidate::CandidateProfile;
use crate::profile::StructuringRejected;
use crate::sources::SourceKind;

/// Fixed reference vocabulary for skill spotting: lowercase match form plus
/// display form. Matching is case-insensitive substring containment, which
/// is intentionally loose ("java" also fires inside "javascript").
pub const SKILL_VOCABULARY: &[(&str, &str)] = &[
    ("python", "Python"),
    ("flask", "Flask"),
    ("django", "Django"),
    ("fastapi", "FastAPI"),
    ("sql", "SQL"),
    ("postgresql", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("gcp", "GCP"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("react", "React"),
    ("node.js", "Node.js"),
    ("node", "Node"),
    ("java", "Java"),
    ("spring", "Spring"),
    ("c++", "C++"),
    ("c#", "C#"),
    ("git", "Git"),
    ("rest", "REST"),
    ("graphql", "GraphQL"),
    ("pandas", "pandas"),
    ("numpy", "NumPy"),
    ("scikit-learn", "scikit-learn"),
    ("machine learning", "Machine Learning"),
    ("nlp", "NLP"),
    ("langchain", "LangChain"),
];

const SUMMARY_MAX_CHARS: usize = 300;
const NAME_MAX_WORDS: usize = 6;
const NAME_MAX_CHARS: usize = 80;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}").unwrap());

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\(?\d{3}\)?[ .\-]?\d{3}[ .\-]?\d{4}").unwrap());

static EXPERIENCE_YEARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\+?\s*(?:years?|yrs?)").unwrap());

const ROLE_MARKERS: &[&str] = &[
    "engineer", "developer", "architect", "scientist", "analyst", "manager", "consultant",
    "designer", "lead", "director",
];

const EDUCATION_MARKERS: &[&str] = &[
    "bachelor", "master", "phd", "b.s", "m.s", "b.sc", "m.sc", "mba", "university", "college",
    "degree",
];

/// Builds a profile from raw text using fixed rules. Rejects only blank
/// input; everything else produces a profile, however sparse.
pub fn parse(
    text: &str,
    tenant_id: &str,
    source_tags: Vec<SourceKind>,
) -> Result<CandidateProfile, StructuringRejected> {
    if text.trim().is_empty() {
        return Err(StructuringRejected);
    }

    let lowered = text.to_lowercase();

    Ok(CandidateProfile {
        id: Uuid::new_v4(),
        tenant_id: tenant_id.to_string(),
        name: first_name_line(text),
        email: EMAIL.find(text).map(|m| m.as_str().to_string()),
        phone: PHONE.find(text).map(|m| m.as_str().to_string()),
        skills: spot_skills(&lowered),
        experience_years: experience_years(&lowered),
        education: marked_line(text, EDUCATION_MARKERS),
        professional_summary: leading_sentences(text, 2),
        current_role: marked_line(text, ROLE_MARKERS),
        location: String::new(),
        source_tags,
        degraded: true,
        created_at: Utc::now(),
    })
}

/// First non-empty line that looks like a name: short, no email or URL.
fn first_name_line(text: &str) -> String {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let words = line.split_whitespace().count();
        if words > NAME_MAX_WORDS || line.chars().count() > NAME_MAX_CHARS {
            continue;
        }
        let lowered = line.to_lowercase();
        if line.contains('@') || lowered.starts_with("http") || lowered.starts_with("www.") {
            continue;
        }
        return line.to_string();
    }
    "Unknown".to_string()
}

/// Vocabulary terms present in the text, ordered by first appearance.
/// Ties (same offset) keep vocabulary order, so results are deterministic.
fn spot_skills(lowered: &str) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = Vec::new();
    for (needle, display) in SKILL_VOCABULARY {
        if let Some(position) = lowered.find(needle) {
            found.push((position, display));
        }
    }
    found.sort_by_key(|(position, _)| *position);
    found.into_iter().map(|(_, display)| display.to_string()).collect()
}

/// First "N years" figure in the text, else 0.
fn experience_years(lowered: &str) -> u32 {
    EXPERIENCE_YEARS
        .captures(lowered)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0)
}

/// First line containing any of the marker words, trimmed. Empty when no
/// line qualifies.
fn marked_line(text: &str, markers: &[&str]) -> String {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.chars().count() > 120 {
            continue;
        }
        let lowered = line.to_lowercase();
        if markers.iter().any(|marker| lowered.contains(marker)) {
            return line.to_string();
        }
    }
    String::new()
}

/// Up to `max_sentences` leading sentences of the flattened text, capped at
/// a fixed character count. A period only ends a sentence when followed by
/// whitespace, so "node.js" and email domains do not split.
fn leading_sentences(text: &str, max_sentences: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = flattened.chars().collect();

    let mut out = String::new();
    let mut sentences = 0;
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if matches!(c, '.' | '!' | '?') {
            let boundary = chars.get(i + 1).map_or(true, |next| next.is_whitespace());
            if boundary {
                sentences += 1;
                if sentences >= max_sentences {
                    break;
                }
            }
        }
        if out.chars().count() >= SUMMARY_MAX_CHARS {
            break;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const JANE: &str = "Jane Doe\nSenior Python Engineer with 6 years building APIs. jane@x.com";

    #[test]
    fn test_jane_doe_fixture() {
        let profile = parse(JANE, "tenant-a", vec![SourceKind::Unknown]).unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.email.as_deref(), Some("jane@x.com"));
        assert_eq!(profile.experience_years, 6);
        assert!(profile.skills.iter().any(|s| s == "Python"));
        assert!(profile.degraded);
        assert_eq!(profile.source_tags, vec![SourceKind::Unknown]);
    }

    #[test]
    fn test_blank_input_is_rejected() {
        assert!(parse("", "tenant-a", vec![]).is_err());
        assert!(parse("   \n\t  ", "tenant-a", vec![]).is_err());
    }

    #[test]
    fn test_same_text_yields_same_fields() {
        let a = parse(JANE, "tenant-a", vec![SourceKind::Unknown]).unwrap();
        let b = parse(JANE, "tenant-a", vec![SourceKind::Unknown]).unwrap();
        assert_eq!(a.name, b.name);
        assert_eq!(a.email, b.email);
        assert_eq!(a.skills, b.skills);
        assert_eq!(a.experience_years, b.experience_years);
        assert_eq!(a.professional_summary, b.professional_summary);
        // Identity differs per ingestion even for identical text.
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_name_falls_back_to_unknown() {
        let text = "https://example.com/profile\njane@x.com\nPython developer with strong background in distributed systems and cloud infrastructure across many employers";
        let profile = parse(text, "tenant-a", vec![]).unwrap();
        assert_eq!(profile.name, "Unknown");
    }

    #[test]
    fn test_skills_ordered_by_first_appearance() {
        let text = "Docker fanatic, also strong in Python and a bit of Redis.";
        let profile = parse(text, "tenant-a", vec![]).unwrap();
        let docker = profile.skills.iter().position(|s| s == "Docker").unwrap();
        let python = profile.skills.iter().position(|s| s == "Python").unwrap();
        let redis = profile.skills.iter().position(|s| s == "Redis").unwrap();
        assert!(docker < python);
        assert!(python < redis);
    }

    #[test]
    fn test_experience_patterns() {
        assert_eq!(experience_years("10+ years of experience"), 10);
        assert_eq!(experience_years("3 yrs in backend work"), 3);
        assert_eq!(experience_years("no figure here"), 0);
    }

    #[test]
    fn test_phone_extraction() {
        let text = "John Smith\nCall (555) 123-4567 or write john@smith.dev";
        let profile = parse(text, "tenant-a", vec![]).unwrap();
        assert_eq!(profile.phone.as_deref(), Some("(555) 123-4567"));
    }

    #[test]
    fn test_role_and_education_lines() {
        let text = "John Smith\nStaff Engineer at Acme\nM.Sc. Computer Science, TU Berlin";
        let profile = parse(text, "tenant-a", vec![]).unwrap();
        assert_eq!(profile.current_role, "Staff Engineer at Acme");
        assert_eq!(profile.education, "M.Sc. Computer Science, TU Berlin");
    }

    #[test]
    fn test_summary_respects_sentence_and_char_caps() {
        let text = "First sentence. Second sentence. Third sentence.";
        let profile = parse(text, "tenant-a", vec![]).unwrap();
        assert_eq!(profile.professional_summary, "First sentence. Second sentence.");

        let long = format!("Word {}", "filler ".repeat(200));
        let capped = parse(&long, "tenant-a", vec![]).unwrap();
        assert!(capped.professional_summary.chars().count() <= SUMMARY_MAX_CHARS);
    }

    #[test]
    fn test_dotted_tokens_do_not_split_sentences() {
        let summary = leading_sentences("Built node.js tooling at scale. Then more.", 1);
        assert_eq!(summary, "Built node.js tooling at scale.");
    }
}
