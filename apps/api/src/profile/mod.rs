// Candidate structuring. The primary path asks the model for a strict
// nine-field JSON object; any provider error or schema violation degrades to
// the deterministic heuristic instead of failing the ingestion. Only blank
// input is rejected outright.

pub mod heuristic;
pub mod prompts;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::llm_client::LlmClient;
use crate::models::candidate::CandidateProfile;
use crate::profile::prompts::{build_profile_parse_prompt, PROFILE_PARSE_SYSTEM};
use crate::sources::SourceKind;

/// Rejection is reserved for blank input. A profile is never fabricated
/// from nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no usable text to structure")]
pub struct StructuringRejected;

/// Raw model output for the nine-field schema. Every field is required;
/// a missing key or wrong type fails deserialization and triggers the
/// heuristic path.
#[derive(Debug, Deserialize)]
struct ParsedFields {
    name: String,
    email: String,
    phone: String,
    skills: Vec<String>,
    experience_years: f64,
    education: String,
    professional_summary: String,
    current_role: String,
    location: String,
}

pub struct StructuredExtractor {
    llm: LlmClient,
}

impl StructuredExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Structures merged source text into a profile.
    ///
    /// Returns `Err` only for blank input. Model failures of any kind fall
    /// back to the heuristic and mark the profile as degraded.
    pub async fn parse(
        &self,
        text: &str,
        tenant_id: &str,
        source_tags: Vec<SourceKind>,
    ) -> Result<CandidateProfile, StructuringRejected> {
        if text.trim().is_empty() {
            return Err(StructuringRejected);
        }

        if self.llm.is_configured() {
            match self.parse_with_model(text).await {
                Ok(fields) => {
                    debug!("candidate structured via model");
                    return Ok(profile_from_fields(fields, tenant_id, source_tags));
                }
                Err(reason) => {
                    warn!("model structuring failed, using heuristic: {reason}");
                }
            }
        } else {
            debug!("model provider not configured, using heuristic");
        }

        heuristic::parse(text, tenant_id, source_tags)
    }

    async fn parse_with_model(&self, text: &str) -> Result<ParsedFields, String> {
        let prompt = build_profile_parse_prompt(text);
        let fields: ParsedFields = self
            .llm
            .call_json(&prompt, PROFILE_PARSE_SYSTEM)
            .await
            .map_err(|e| e.to_string())?;
        validate_fields(&fields)?;
        Ok(fields)
    }
}

/// Semantic checks on top of the schema: deserialization guarantees shape,
/// this guards values the model must not get wrong.
fn validate_fields(fields: &ParsedFields) -> Result<(), String> {
    if fields.name.trim().is_empty() {
        return Err("name is empty".to_string());
    }
    if !fields.experience_years.is_finite() || fields.experience_years < 0.0 {
        return Err(format!("experience_years out of range: {}", fields.experience_years));
    }
    if fields.experience_years > 70.0 {
        return Err(format!("experience_years implausible: {}", fields.experience_years));
    }
    Ok(())
}

fn profile_from_fields(
    fields: ParsedFields,
    tenant_id: &str,
    source_tags: Vec<SourceKind>,
) -> CandidateProfile {
    CandidateProfile {
        id: Uuid::new_v4(),
        tenant_id: tenant_id.to_string(),
        name: fields.name.trim().to_string(),
        email: non_empty(fields.email),
        phone: non_empty(fields.phone),
        skills: CandidateProfile::normalize_skills(fields.skills),
        experience_years: fields.experience_years.round().max(0.0) as u32,
        education: fields.education.trim().to_string(),
        professional_summary: fields.professional_summary.trim().to_string(),
        current_role: fields.current_role.trim().to_string(),
        location: fields.location.trim().to_string(),
        source_tags,
        degraded: false,
        created_at: Utc::now(),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fields() -> ParsedFields {
        ParsedFields {
            name: "Jane Doe".to_string(),
            email: "jane@x.com".to_string(),
            phone: String::new(),
            skills: vec!["Python".to_string(), "python".to_string(), "Docker".to_string()],
            experience_years: 6.0,
            education: "B.Sc. Computer Science".to_string(),
            professional_summary: "Backend engineer.".to_string(),
            current_role: "Senior Engineer".to_string(),
            location: "Berlin".to_string(),
        }
    }

    #[test]
    fn test_schema_requires_every_field() {
        // phone is missing
        let incomplete = r#"{
            "name": "Jane",
            "email": "",
            "skills": [],
            "experience_years": 2,
            "education": "",
            "professional_summary": "",
            "current_role": "",
            "location": ""
        }"#;
        assert!(serde_json::from_str::<ParsedFields>(incomplete).is_err());
    }

    #[test]
    fn test_schema_rejects_wrong_types() {
        let wrong = r#"{
            "name": "Jane",
            "email": "",
            "phone": "",
            "skills": "Python",
            "experience_years": 2,
            "education": "",
            "professional_summary": "",
            "current_role": "",
            "location": ""
        }"#;
        assert!(serde_json::from_str::<ParsedFields>(wrong).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_name_and_bad_years() {
        let mut fields = make_fields();
        fields.name = "   ".to_string();
        assert!(validate_fields(&fields).is_err());

        let mut fields = make_fields();
        fields.experience_years = -1.0;
        assert!(validate_fields(&fields).is_err());

        let mut fields = make_fields();
        fields.experience_years = 200.0;
        assert!(validate_fields(&fields).is_err());

        assert!(validate_fields(&make_fields()).is_ok());
    }

    #[test]
    fn test_profile_from_fields_normalizes() {
        let profile = profile_from_fields(make_fields(), "tenant-a", vec![SourceKind::Pdf]);
        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.email.as_deref(), Some("jane@x.com"));
        assert_eq!(profile.phone, None);
        assert_eq!(profile.skills, vec!["Python", "Docker"]);
        assert_eq!(profile.experience_years, 6);
        assert!(!profile.degraded);
        assert_eq!(profile.tenant_id, "tenant-a");
    }

    #[tokio::test]
    async fn test_blank_text_rejected_before_any_provider_call() {
        let extractor = StructuredExtractor::new(LlmClient::new(None));
        assert!(extractor.parse("", "tenant-a", vec![]).await.is_err());
        assert!(extractor.parse("  \n ", "tenant-a", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_model_uses_heuristic() {
        let extractor = StructuredExtractor::new(LlmClient::new(None));
        let profile = extractor
            .parse(
                "Jane Doe\nSenior Python Engineer with 6 years building APIs. jane@x.com",
                "tenant-a",
                vec![SourceKind::Unknown],
            )
            .await
            .unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert!(profile.degraded);
        assert_eq!(profile.source_tags, vec![SourceKind::Unknown]);
    }
}
