// Public-profile page extraction for LinkedIn-class sources. Scraping is
// best effort: selectors target the stable profile regions first and fall
// back to full visible text, and any layout breakage surfaces as a typed
// failure rather than leaking upstream.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::extract::rate_limit::{HostCooldowns, DEFAULT_COOLDOWN};
use crate::extract::{ExtractedText, ExtractionFailure};
use crate::sources::SourceKind;

/// Hard cap on returned profile text, bounding downstream model cost.
pub const MAX_PROFILE_CHARS: usize = 2000;

const HOST: &str = "www.linkedin.com";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Fetches a public profile page exactly once and extracts its text.
/// No automatic retry: the per-source failure is reported instead.
pub async fn extract(
    http: &Client,
    cooldowns: &HostCooldowns,
    reference: &str,
    timeout: Duration,
) -> Result<ExtractedText, ExtractionFailure> {
    if cooldowns.is_limited(HOST) {
        return Err(ExtractionFailure::RateLimited { host: HOST.to_string() });
    }

    let url = normalize_profile_url(reference);
    let response = http
        .get(&url)
        .header("User-Agent", BROWSER_USER_AGENT)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ExtractionFailure::Network(format!("fetch {url}: {e}")))?;

    let status = response.status().as_u16();
    match status {
        404 => return Err(ExtractionFailure::NotFound(url)),
        403 | 429 => {
            cooldowns.record_limited(HOST, DEFAULT_COOLDOWN);
            return Err(ExtractionFailure::RateLimited { host: HOST.to_string() });
        }
        s if !(200..300).contains(&s) => {
            return Err(ExtractionFailure::Network(format!("{url} returned status {s}")));
        }
        _ => {}
    }

    let body = response
        .text()
        .await
        .map_err(|e| ExtractionFailure::Network(format!("read {url}: {e}")))?;
    cooldowns.record_success(HOST);

    let text = profile_text(&body)
        .ok_or_else(|| ExtractionFailure::Parse(format!("no visible text at {url}")))?;
    debug!(chars = text.chars().count(), "profile page text extracted");
    Ok(ExtractedText::new(text, SourceKind::Linkedin))
}

/// Accepts a full URL, a bare `linkedin.com/in/...` reference, or a plain
/// profile slug, and returns something fetchable.
fn normalize_profile_url(reference: &str) -> String {
    let trimmed = reference.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if trimmed.to_lowercase().contains("linkedin.com/") {
        format!("https://{trimmed}")
    } else {
        format!("https://www.linkedin.com/in/{}", trimmed.trim_matches('/'))
    }
}

// Parsed HTML holds non-Send internals, so everything below is synchronous
// and runs only after the fetch has completed.

/// Pulls text from the profile-relevant regions when the markup exposes
/// them, else falls back to full visible body text. Always truncated to
/// `MAX_PROFILE_CHARS`.
fn profile_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let mut parts: Vec<String> = Vec::new();
    for css in ["h1", ".top-card-layout__headline", ".core-section-container__content"] {
        let selector = match Selector::parse(css) {
            Ok(selector) => selector,
            Err(_) => continue,
        };
        for element in document.select(&selector) {
            let text = element
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }

    let combined = if parts.is_empty() { visible_body_text(&document) } else { parts.join("\n") };
    let combined = combined.trim();
    if combined.is_empty() {
        return None;
    }
    Some(combined.chars().take(MAX_PROFILE_CHARS).collect())
}

fn visible_body_text(document: &Html) -> String {
    let selector = Selector::parse("body").unwrap();
    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };
    let mut out = String::new();
    for chunk in body.text() {
        let trimmed = chunk.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(trimmed);
    }
    out
}
