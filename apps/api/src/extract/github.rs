// GitHub profile extraction via the public REST API: one call for the user,
// one for their repositories, rendered into a plain-text profile block.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::extract::rate_limit::{HostCooldowns, DEFAULT_COOLDOWN};
use crate::extract::{ExtractedText, ExtractionFailure};
use crate::sources::SourceKind;

const API_HOST: &str = "api.github.com";
// GitHub rejects requests without a User-Agent.
const API_USER_AGENT: &str = "sourcer-ingest";

/// Repositories included in the rendered profile, ranked by stars.
const TOP_REPOS: usize = 10;
/// The repos endpoint cannot sort by stars server-side; fetch one page and
/// rank locally.
const REPOS_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    #[serde(default)]
    public_repos: u32,
    #[serde(default)]
    followers: u32,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    name: String,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u32,
}

pub async fn extract(
    http: &Client,
    cooldowns: &HostCooldowns,
    reference: &str,
    token: Option<&str>,
    timeout: Duration,
) -> Result<ExtractedText, ExtractionFailure> {
    if cooldowns.is_limited(API_HOST) {
        return Err(ExtractionFailure::RateLimited { host: API_HOST.to_string() });
    }

    let username = username_from_reference(reference)
        .ok_or_else(|| ExtractionFailure::Parse(format!("no username in '{reference}'")))?;

    let user_url = format!("https://{API_HOST}/users/{username}");
    let repos_url = format!("https://{API_HOST}/users/{username}/repos?per_page={REPOS_PAGE}&sort=pushed");

    let user: GithubUser = get_json(http, cooldowns, &user_url, token, timeout).await?;
    let repos: Vec<GithubRepo> = get_json(http, cooldowns, &repos_url, token, timeout).await?;
    debug!(username = %user.login, repos = repos.len(), "github profile fetched");

    Ok(ExtractedText::new(render_profile(&user, repos), SourceKind::Github))
}

async fn get_json<T: DeserializeOwned>(
    http: &Client,
    cooldowns: &HostCooldowns,
    url: &str,
    token: Option<&str>,
    timeout: Duration,
) -> Result<T, ExtractionFailure> {
    let mut request = http
        .get(url)
        .header("User-Agent", API_USER_AGENT)
        .header("Accept", "application/vnd.github.v3+json")
        .timeout(timeout);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ExtractionFailure::Network(format!("fetch {url}: {e}")))?;

    if let Some(failure) = classify_status(response.status().as_u16(), url) {
        if matches!(failure, ExtractionFailure::RateLimited { .. }) {
            cooldowns.record_limited(API_HOST, DEFAULT_COOLDOWN);
        }
        return Err(failure);
    }
    cooldowns.record_success(API_HOST);

    response
        .json::<T>()
        .await
        .map_err(|e| ExtractionFailure::Parse(format!("decode {url}: {e}")))
}

/// 403 and 429 both mean "back off" on this API. 404 is a missing profile,
/// which callers must be able to tell apart from transport trouble.
fn classify_status(status: u16, url: &str) -> Option<ExtractionFailure> {
    match status {
        200..=299 => None,
        404 => Some(ExtractionFailure::NotFound(url.to_string())),
        403 | 429 => Some(ExtractionFailure::RateLimited { host: API_HOST.to_string() }),
        s => Some(ExtractionFailure::Network(format!("{url} returned status {s}"))),
    }
}

/// Pulls a username out of a profile URL or accepts a bare username.
fn username_from_reference(reference: &str) -> Option<String> {
    let trimmed = reference.trim().trim_end_matches('/');
    let candidate = trimmed.rsplit('/').next().unwrap_or(trimmed).trim();
    if candidate.is_empty()
        || !candidate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    Some(candidate.to_string())
}

fn render_profile(user: &GithubUser, mut repos: Vec<GithubRepo>) -> String {
    let mut text = format!(
        "GitHub Profile: {}\nName: {}\nBio: {}\nLocation: {}\nPublic Repos: {}\nFollowers: {}\n\nTop Repositories:",
        user.login,
        user.name.as_deref().unwrap_or(""),
        user.bio.as_deref().unwrap_or(""),
        user.location.as_deref().unwrap_or(""),
        user.public_repos,
        user.followers,
    );

    repos.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    for repo in repos.iter().take(TOP_REPOS) {
        text.push_str(&format!(
            "\n- {}: {}",
            repo.name,
            repo.description.as_deref().unwrap_or("")
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user() -> GithubUser {
        GithubUser {
            login: "janedoe".to_string(),
            name: Some("Jane Doe".to_string()),
            bio: Some("Backend engineer".to_string()),
            location: Some("Berlin".to_string()),
            public_repos: 12,
            followers: 34,
        }
    }

    #[test]
    fn test_username_from_url_variants() {
        assert_eq!(
            username_from_reference("https://github.com/janedoe").as_deref(),
            Some("janedoe")
        );
        assert_eq!(
            username_from_reference("github.com/janedoe/").as_deref(),
            Some("janedoe")
        );
        assert_eq!(username_from_reference("janedoe").as_deref(), Some("janedoe"));
    }

    #[test]
    fn test_username_rejects_garbage() {
        assert!(username_from_reference("").is_none());
        assert!(username_from_reference("   ").is_none());
        assert!(username_from_reference("https://github.com/jane doe").is_none());
    }

    #[test]
    fn test_classify_status_mapping() {
        assert!(classify_status(200, "u").is_none());
        assert!(matches!(classify_status(404, "u"), Some(ExtractionFailure::NotFound(_))));
        assert!(matches!(
            classify_status(403, "u"),
            Some(ExtractionFailure::RateLimited { .. })
        ));
        assert!(matches!(
            classify_status(429, "u"),
            Some(ExtractionFailure::RateLimited { .. })
        ));
        assert!(matches!(classify_status(500, "u"), Some(ExtractionFailure::Network(_))));
    }

    #[test]
    fn test_render_profile_ranks_repos_by_stars() {
        let repos = vec![
            GithubRepo { name: "small".into(), description: None, stargazers_count: 2 },
            GithubRepo {
                name: "big".into(),
                description: Some("The popular one".into()),
                stargazers_count: 90,
            },
        ];
        let text = render_profile(&make_user(), repos);
        assert!(text.starts_with("GitHub Profile: janedoe"));
        assert!(text.contains("Bio: Backend engineer"));
        let big = text.find("- big:").unwrap();
        let small = text.find("- small:").unwrap();
        assert!(big < small);
    }

    #[test]
    fn test_render_profile_tolerates_missing_fields() {
        let user = GithubUser {
            login: "ghost".to_string(),
            name: None,
            bio: None,
            location: None,
            public_repos: 0,
            followers: 0,
        };
        let text = render_profile(&user, vec![]);
        assert!(text.contains("GitHub Profile: ghost"));
        assert!(text.ends_with("Top Repositories:"));
    }
}
