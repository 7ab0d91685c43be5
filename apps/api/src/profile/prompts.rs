// Prompts for candidate structuring. The schema listed here is the contract
// the response validator enforces; keep the two in sync.

pub const PROFILE_PARSE_SYSTEM: &str = "You are an expert technical recruiter parsing candidate evidence. \
You extract structured candidate information from raw text. \
You MUST respond with valid JSON only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences. \
Do NOT invent information that is not present in the text.";

pub const PROFILE_PARSE_PROMPT_TEMPLATE: &str = r#"Extract a structured candidate profile from the text below.

Return a JSON object with EXACTLY these fields:
{
  "name": "Full name of the candidate",
  "email": "Email address, or empty string if not found",
  "phone": "Phone number, or empty string if not found",
  "skills": ["Technical and professional skills as an array of strings"],
  "experience_years": 5,
  "education": "Highest degree and institution, or empty string",
  "professional_summary": "Two to three sentences on the candidate's background and focus",
  "current_role": "Most recent job title, or empty string",
  "location": "City or region, or empty string"
}

Rules:
- Only extract information clearly stated in the text.
- experience_years is a whole number of years; estimate from job history when not stated outright.
- Use empty strings or 0 when information is unavailable. Never omit a field.

CANDIDATE TEXT:
{candidate_text}"#;

/// Fills the candidate text into the parse prompt.
pub fn build_profile_parse_prompt(candidate_text: &str) -> String {
    PROFILE_PARSE_PROMPT_TEMPLATE.replace("{candidate_text}", candidate_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_candidate_text() {
        let prompt = build_profile_parse_prompt("Jane Doe, Python engineer");
        assert!(prompt.contains("Jane Doe, Python engineer"));
        assert!(!prompt.contains("{candidate_text}"));
    }

    #[test]
    fn test_prompt_lists_all_schema_fields() {
        for field in [
            "name",
            "email",
            "phone",
            "skills",
            "experience_years",
            "education",
            "professional_summary",
            "current_role",
            "location",
        ] {
            assert!(
                PROFILE_PARSE_PROMPT_TEMPLATE.contains(&format!("\"{field}\"")),
                "prompt is missing field {field}"
            );
        }
    }
}
