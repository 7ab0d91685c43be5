// Text extraction. One extractor per source kind, each producing plain text
// or a typed failure. Failures here are per-source and never abort the
// surrounding ingestion on their own.

pub mod docx;
pub mod github;
pub mod linkedin;
pub mod pdf;
pub mod rate_limit;

use std::time::Duration;

use thiserror::Error;

use crate::sources::{Source, SourceKind};

/// Plain text plus provenance. Produced by exactly one extractor and not
/// mutated afterward.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub source_kind: SourceKind,
    pub char_count: usize,
}

impl ExtractedText {
    pub fn new(text: String, source_kind: SourceKind) -> Self {
        let char_count = text.chars().count();
        Self {
            text,
            source_kind,
            char_count,
        }
    }
}

/// Why a single source failed to yield text.
#[derive(Debug, Clone, Error)]
pub enum ExtractionFailure {
    #[error("network failure: {0}")]
    Network(String),
    #[error("parse failure: {0}")]
    Parse(String),
    #[error("rate limited by {host}")]
    RateLimited { host: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unreadable document: {0}")]
    Unreadable(String),
    #[error("document contains no extractable text")]
    Empty,
}

impl ExtractionFailure {
    /// Stable machine-readable code reported in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ExtractionFailure::Network(_) => "network_failure",
            ExtractionFailure::Parse(_) => "parse_failure",
            ExtractionFailure::RateLimited { .. } => "rate_limited",
            ExtractionFailure::NotFound(_) => "not_found",
            ExtractionFailure::Unreadable(_) => "unreadable_document",
            ExtractionFailure::Empty => "empty_document",
        }
    }

    /// Whether retrying the same source later could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractionFailure::Network(_) | ExtractionFailure::RateLimited { .. }
        )
    }
}

/// All extractors behind one dispatch point, sharing the outbound HTTP
/// client and the per-host cooldown tracker.
pub struct Extractors {
    http: reqwest::Client,
    cooldowns: rate_limit::HostCooldowns,
    fetch_timeout: Duration,
    github_token: Option<String>,
    docx_enabled: bool,
}

impl Extractors {
    pub fn new(fetch_timeout: Duration, github_token: Option<String>, docx_enabled: bool) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(fetch_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            cooldowns: rate_limit::HostCooldowns::new(),
            fetch_timeout,
            github_token,
            docx_enabled,
        }
    }

    /// Extracts plain text from one classified source.
    ///
    /// `Unknown` sources that carry inline bytes are treated as raw text;
    /// callers must filter out `Unknown` sources without data before calling.
    pub async fn extract(&self, source: &Source) -> Result<ExtractedText, ExtractionFailure> {
        match source.kind {
            SourceKind::Pdf => {
                let data = inline_data(source)?;
                pdf::extract(data).await
            }
            SourceKind::Docx => {
                if !self.docx_enabled {
                    return Err(ExtractionFailure::Unreadable(
                        "office-document support is not available in this build".to_string(),
                    ));
                }
                let data = inline_data(source)?;
                docx::extract(&data)
            }
            SourceKind::Linkedin => {
                linkedin::extract(
                    &self.http,
                    &self.cooldowns,
                    &source.raw_reference,
                    self.fetch_timeout,
                )
                .await
            }
            SourceKind::Github => {
                github::extract(
                    &self.http,
                    &self.cooldowns,
                    &source.raw_reference,
                    self.github_token.as_deref(),
                    self.fetch_timeout,
                )
                .await
            }
            SourceKind::Unknown => {
                let data = inline_data(source)?;
                let text = String::from_utf8_lossy(&data).to_string();
                if text.trim().is_empty() {
                    return Err(ExtractionFailure::Empty);
                }
                Ok(ExtractedText::new(text, SourceKind::Unknown))
            }
        }
    }
}

fn inline_data(source: &Source) -> Result<bytes::Bytes, ExtractionFailure> {
    source.data.clone().ok_or_else(|| {
        ExtractionFailure::Unreadable(format!("no content uploaded for '{}'", source.raw_reference))
    })
}
