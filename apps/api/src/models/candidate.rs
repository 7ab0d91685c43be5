// Candidate profile model shared by the structuring, persistence, and
// matching layers, plus the database row shape it maps to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::sources::SourceKind;

/// Structured candidate record. Created once per ingestion and treated as
/// immutable afterward; match scores attach to responses, never to this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub education: String,
    pub professional_summary: String,
    pub current_role: String,
    pub location: String,
    /// Source kinds that contributed text, in submission order. Never empty
    /// on a profile that was actually created.
    pub source_tags: Vec<SourceKind>,
    /// True when the deterministic fallback produced this profile instead of
    /// the model.
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
}

impl CandidateProfile {
    /// Trims entries, drops empties, and dedups case-insensitively while
    /// keeping first-seen order.
    pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for skill in skills {
            let skill = skill.trim().to_string();
            if skill.is_empty() {
                continue;
            }
            if seen.insert(skill.to_lowercase()) {
                out.push(skill);
            }
        }
        out
    }

    /// Canonical text embedded for this candidate: summary plus skills.
    /// Falls back to a fixed placeholder so embedding never sees an empty
    /// input.
    pub fn embedding_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.professional_summary.trim().is_empty() {
            parts.push(self.professional_summary.trim());
        }
        let skills = self.skills.join(" ");
        if !skills.trim().is_empty() {
            parts.push(skills.trim());
        }
        if parts.is_empty() {
            "candidate profile".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Database row shape for `candidate_profiles`.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: i32,
    pub education: String,
    pub professional_summary: String,
    pub current_role: String,
    pub location: String,
    pub source_tags: Vec<String>,
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateProfile {
    fn from(row: CandidateRow) -> Self {
        CandidateProfile {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            skills: row.skills,
            experience_years: row.experience_years.max(0) as u32,
            education: row.education,
            professional_summary: row.professional_summary,
            current_role: row.current_role,
            location: row.location,
            source_tags: row.source_tags.iter().map(|s| SourceKind::parse(s)).collect(),
            degraded: row.degraded,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_profile() -> CandidateProfile {
        CandidateProfile {
            id: Uuid::new_v4(),
            tenant_id: "tenant-a".to_string(),
            name: "Jane Doe".to_string(),
            email: Some("jane@x.com".to_string()),
            phone: None,
            skills: vec!["Python".to_string(), "Docker".to_string()],
            experience_years: 6,
            education: String::new(),
            professional_summary: "Senior Python engineer building APIs.".to_string(),
            current_role: "Senior Engineer".to_string(),
            location: String::new(),
            source_tags: vec![SourceKind::Pdf],
            degraded: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_skills_dedups_case_insensitively() {
        let normalized = CandidateProfile::normalize_skills(vec![
            "Python".to_string(),
            "  python ".to_string(),
            "".to_string(),
            "Docker".to_string(),
            "PYTHON".to_string(),
        ]);
        assert_eq!(normalized, vec!["Python", "Docker"]);
    }

    #[test]
    fn test_embedding_text_joins_summary_and_skills() {
        let profile = make_profile();
        assert_eq!(
            profile.embedding_text(),
            "Senior Python engineer building APIs. Python Docker"
        );
    }

    #[test]
    fn test_embedding_text_never_empty() {
        let mut profile = make_profile();
        profile.professional_summary = String::new();
        profile.skills = vec![];
        assert_eq!(profile.embedding_text(), "candidate profile");
    }

    #[test]
    fn test_row_roundtrip_maps_source_tags() {
        let row = CandidateRow {
            id: Uuid::new_v4(),
            tenant_id: "tenant-a".to_string(),
            name: "Jane Doe".to_string(),
            email: None,
            phone: None,
            skills: vec!["Python".to_string()],
            experience_years: 6,
            education: String::new(),
            professional_summary: String::new(),
            current_role: String::new(),
            location: String::new(),
            source_tags: vec!["pdf".to_string(), "github".to_string(), "bogus".to_string()],
            degraded: true,
            created_at: Utc::now(),
        };
        let profile = CandidateProfile::from(row);
        assert_eq!(
            profile.source_tags,
            vec![SourceKind::Pdf, SourceKind::Github, SourceKind::Unknown]
        );
        assert!(profile.degraded);
    }
}
