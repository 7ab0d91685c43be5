// Source classification. Every ingestion input is classified exactly once,
// before any extraction work happens, and carries its classification through
// the rest of the pipeline.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed set of recognized source kinds. Downstream extractors match on
/// this exhaustively, so adding a kind is a compile-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Pdf,
    Docx,
    Linkedin,
    Github,
    Unknown,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Docx => "docx",
            SourceKind::Linkedin => "linkedin",
            SourceKind::Github => "github",
            SourceKind::Unknown => "unknown",
        }
    }

    /// Inverse of `as_str`. Unrecognized labels map to `Unknown` so stored
    /// tags from older rows never fail to load.
    pub fn parse(label: &str) -> SourceKind {
        match label {
            "pdf" => SourceKind::Pdf,
            "docx" => SourceKind::Docx,
            "linkedin" => SourceKind::Linkedin,
            "github" => SourceKind::Github,
            _ => SourceKind::Unknown,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingestion input: a file name or URL reference, its classification,
/// and the uploaded bytes when the caller sent content inline.
#[derive(Debug, Clone)]
pub struct Source {
    pub raw_reference: String,
    pub kind: SourceKind,
    pub data: Option<Bytes>,
}

impl Source {
    pub fn new(raw_reference: impl Into<String>, data: Option<Bytes>) -> Self {
        let raw_reference = raw_reference.into();
        let kind = detect(&raw_reference);
        Self {
            raw_reference,
            kind,
            data,
        }
    }
}

static LINKEDIN_PROFILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/in/[a-z0-9\-_%]+").unwrap()
});

static GITHUB_PROFILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://)?(?:www\.)?github\.com/[a-z0-9\-]+").unwrap());

/// Classifies a raw reference. Total over arbitrary strings: anything
/// unrecognized maps to `Unknown` instead of failing.
///
/// URL checks run before extension checks. A saved profile page named
/// `linkedin.com/in/someone.pdf` is a profile URL, not a document.
pub fn detect(reference: &str) -> SourceKind {
    let normalized = reference.trim().to_lowercase();
    if normalized.is_empty() {
        return SourceKind::Unknown;
    }
    if LINKEDIN_PROFILE.is_match(&normalized) {
        return SourceKind::Linkedin;
    }
    if GITHUB_PROFILE.is_match(&normalized) {
        return SourceKind::Github;
    }
    if normalized.ends_with(".pdf") {
        return SourceKind::Pdf;
    }
    if normalized.ends_with(".docx") || normalized.ends_with(".doc") {
        return SourceKind::Docx;
    }
    SourceKind::Unknown
}
