// Ingestion pipeline: classify, extract concurrently, merge, structure once,
// index, persist, and optionally score. Partial source failure is the normal
// case and never aborts an ingestion that still has usable text.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{ExtractedText, ExtractionFailure, Extractors};
use crate::index::embeddings::{EmbeddingClient, EmbeddingError};
use crate::index::VectorIndex;
use crate::matching::weights::AdaptiveRankingEngine;
use crate::matching::{self, MatchResult};
use crate::models::candidate::CandidateProfile;
use crate::profile::{StructuredExtractor, StructuringRejected};
use crate::repository::ProfileRepository;
use crate::sources::{Source, SourceKind};

/// Separator between per-source texts when they merge into one structuring
/// input.
const SOURCE_SEPARATOR: &str = "\n\n";

/// Tunable pipeline limits, all sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PipelineLimits {
    /// Concurrent batch items in flight.
    pub worker_pool_size: usize,
    /// Cap on one source extraction, end to end.
    pub extract_timeout: Duration,
    /// Cap on one whole ingestion request.
    pub request_timeout: Duration,
}

/// Per-source failure as reported in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub reference: String,
    pub kind: SourceKind,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl SourceFailure {
    fn from_extraction(source: &Source, failure: &ExtractionFailure) -> Self {
        Self {
            reference: source.raw_reference.clone(),
            kind: source.kind,
            code: failure.code().to_string(),
            message: failure.to_string(),
            retryable: failure.is_retryable(),
        }
    }
}

/// Outcome of one successful ingestion. Field names are the response wire
/// names; this struct serializes straight into API responses.
#[derive(Debug, Serialize)]
pub struct IngestOutcome {
    pub candidate: CandidateProfile,
    /// Kinds that actually contributed text, in submission order.
    pub sources: Vec<SourceKind>,
    pub source_failures: Vec<SourceFailure>,
    /// False when the embedding or index write step failed; the profile
    /// exists but search cannot see it yet.
    pub indexed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<MatchResult>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no usable text from any supplied source")]
    NoUsableText { failures: Vec<SourceFailure> },

    #[error("ingestion timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IngestError {
    /// Whether any underlying source failure was a rate limit, in which case
    /// the whole request is reported as retryable.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            IngestError::NoUsableText { failures } => {
                failures.iter().any(|failure| failure.code == "rate_limited")
            }
            _ => false,
        }
    }
}

/// One item of a batch upload. Each becomes its own candidate.
#[derive(Debug)]
pub struct BatchItem {
    pub filename: String,
    pub data: Bytes,
}

#[derive(Debug, Serialize)]
pub struct BatchItemReport {
    pub filename: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<IngestOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemReport {
    fn success(filename: String, outcome: IngestOutcome) -> Self {
        Self { filename, status: "success", outcome: Some(outcome), error: None }
    }

    fn failure(filename: String, error: String) -> Self {
        Self { filename, status: "error", outcome: None, error: Some(error) }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// One report per uploaded file, in upload order.
    pub items: Vec<BatchItemReport>,
}

/// A search hit: the stored profile plus how it scored against the query
/// description.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub candidate: CandidateProfile,
    pub similarity: f64,
    pub match_score: MatchResult,
}

pub struct IngestionPipeline {
    extractors: Arc<Extractors>,
    structurer: StructuredExtractor,
    embeddings: EmbeddingClient,
    index: Arc<dyn VectorIndex>,
    repository: Arc<dyn ProfileRepository>,
    ranking: Arc<AdaptiveRankingEngine>,
    batch_permits: Semaphore,
    limits: PipelineLimits,
}

impl IngestionPipeline {
    pub fn new(
        extractors: Arc<Extractors>,
        structurer: StructuredExtractor,
        embeddings: EmbeddingClient,
        index: Arc<dyn VectorIndex>,
        repository: Arc<dyn ProfileRepository>,
        ranking: Arc<AdaptiveRankingEngine>,
        limits: PipelineLimits,
    ) -> Self {
        Self {
            extractors,
            structurer,
            embeddings,
            index,
            repository,
            ranking,
            batch_permits: Semaphore::new(limits.worker_pool_size.max(1)),
            limits,
        }
    }

    /// Ingests one candidate under the request-level timeout.
    pub async fn ingest_with_timeout(
        &self,
        sources: Vec<Source>,
        job_description: Option<&str>,
        tenant_id: &str,
    ) -> Result<IngestOutcome, IngestError> {
        match tokio::time::timeout(
            self.limits.request_timeout,
            self.ingest(sources, job_description, tenant_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(IngestError::Timeout(self.limits.request_timeout)),
        }
    }

    /// Ingests one candidate from the given sources.
    ///
    /// Sources are extracted concurrently but merged in submission order.
    /// Producing a profile requires at least one source to yield text; the
    /// rest surface as per-source failures alongside it.
    pub async fn ingest(
        &self,
        sources: Vec<Source>,
        job_description: Option<&str>,
        tenant_id: &str,
    ) -> Result<IngestOutcome, IngestError> {
        let extractions = join_all(sources.iter().map(|source| self.extract_one(source))).await;

        let mut texts: Vec<ExtractedText> = Vec::new();
        let mut failures: Vec<SourceFailure> = Vec::new();
        for extraction in extractions {
            match extraction {
                Ok(text) => texts.push(text),
                Err(failure) => failures.push(failure),
            }
        }

        if texts.is_empty() {
            return Err(IngestError::NoUsableText { failures });
        }

        let contributing: Vec<SourceKind> = texts.iter().map(|t| t.source_kind).collect();
        let combined =
            texts.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(SOURCE_SEPARATOR);

        let profile = match self.structurer.parse(&combined, tenant_id, contributing.clone()).await
        {
            Ok(profile) => profile,
            Err(StructuringRejected) => return Err(IngestError::NoUsableText { failures }),
        };

        // One embedding serves both indexing and, when a description was
        // given, the semantic sub-score.
        let candidate_vector = self.embed_candidate(&profile).await;
        let indexed = match &candidate_vector {
            Some(vector) => match self.index.upsert(tenant_id, profile.id, vector.clone()).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(candidate_id = %profile.id, "index write failed: {e}");
                    false
                }
            },
            None => false,
        };

        self.repository.save(&profile).await?;

        let match_score = match job_description {
            Some(description) if !description.trim().is_empty() => {
                Some(self.score(&profile, description, candidate_vector.as_deref()).await)
            }
            _ => None,
        };

        info!(
            candidate_id = %profile.id,
            tenant_id,
            sources = contributing.len(),
            failures = failures.len(),
            degraded = profile.degraded,
            indexed,
            "candidate ingested"
        );

        Ok(IngestOutcome {
            candidate: profile,
            sources: contributing,
            source_failures: failures,
            indexed,
            match_score,
        })
    }

    /// Processes independent uploads through the worker pool. Every item
    /// gets a report, in upload order; one bad file never touches its
    /// neighbours.
    pub async fn ingest_batch(
        &self,
        items: Vec<BatchItem>,
        job_description: Option<&str>,
        tenant_id: &str,
    ) -> BatchOutcome {
        let total = items.len();
        let reports = join_all(
            items.into_iter().map(|item| self.ingest_batch_item(item, job_description, tenant_id)),
        )
        .await;

        let successful = reports.iter().filter(|report| report.status == "success").count();
        info!(total, successful, failed = total - successful, tenant_id, "batch ingestion finished");

        BatchOutcome { total, successful, failed: total - successful, items: reports }
    }

    async fn ingest_batch_item(
        &self,
        item: BatchItem,
        job_description: Option<&str>,
        tenant_id: &str,
    ) -> BatchItemReport {
        let filename = item.filename.clone();

        let permit = self.batch_permits.acquire().await;
        if permit.is_err() {
            return BatchItemReport::failure(filename, "worker pool unavailable".to_string());
        }

        let source = Source::new(item.filename, Some(item.data));
        match self.ingest_with_timeout(vec![source], job_description, tenant_id).await {
            Ok(outcome) => BatchItemReport::success(filename, outcome),
            Err(e) => BatchItemReport::failure(filename, e.to_string()),
        }
    }

    /// Semantic search: embed the description, query the tenant's namespace,
    /// hydrate the stored profiles, and score each hit against the
    /// description.
    pub async fn search(
        &self,
        tenant_id: &str,
        job_description: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, AppError> {
        let query_vector = self.embeddings.embed(job_description).await.map_err(|e| match e {
            EmbeddingError::NotConfigured => AppError::UnprocessableEntity(
                "semantic search requires an embedding provider, and none is configured"
                    .to_string(),
            ),
            other => AppError::Embedding(other.to_string()),
        })?;

        let neighbours = self.index.query(tenant_id, &query_vector, top_k).await?;
        let ids: Vec<Uuid> = neighbours.iter().map(|(id, _)| *id).collect();
        let profiles = self.repository.find_many(tenant_id, &ids).await?;
        let by_id: HashMap<Uuid, CandidateProfile> =
            profiles.into_iter().map(|profile| (profile.id, profile)).collect();

        let weights = self.ranking.current_weights().await;
        let mut hits: Vec<SearchHit> = Vec::new();
        for (id, similarity) in neighbours {
            // The index can be momentarily ahead of the repository.
            let Some(candidate) = by_id.get(&id) else {
                continue;
            };
            let match_score =
                matching::score(candidate, job_description, Some(similarity as f64), weights);
            hits.push(SearchHit {
                candidate: candidate.clone(),
                similarity: similarity as f64,
                match_score,
            });
        }

        hits.sort_by(|a, b| {
            b.match_score
                .overall_score
                .partial_cmp(&a.match_score.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(hits)
    }

    async fn extract_one(&self, source: &Source) -> Result<ExtractedText, SourceFailure> {
        // An unrecognized reference with nothing inline cannot be extracted;
        // it is reported and skipped rather than failing the request.
        if source.kind == SourceKind::Unknown && source.data.is_none() {
            return Err(SourceFailure {
                reference: source.raw_reference.clone(),
                kind: SourceKind::Unknown,
                code: "unknown_format".to_string(),
                message: "unrecognized source reference".to_string(),
                retryable: false,
            });
        }

        match tokio::time::timeout(self.limits.extract_timeout, self.extractors.extract(source))
            .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(failure)) => {
                warn!(
                    reference = %source.raw_reference,
                    kind = %source.kind,
                    code = failure.code(),
                    "source extraction failed"
                );
                Err(SourceFailure::from_extraction(source, &failure))
            }
            Err(_) => Err(SourceFailure {
                reference: source.raw_reference.clone(),
                kind: source.kind,
                code: "network_failure".to_string(),
                message: format!(
                    "extraction timed out after {}s",
                    self.limits.extract_timeout.as_secs()
                ),
                retryable: true,
            }),
        }
    }

    async fn embed_candidate(&self, profile: &CandidateProfile) -> Option<Vec<f32>> {
        if !self.embeddings.is_configured() {
            return None;
        }
        match self.embeddings.embed(&profile.embedding_text()).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(candidate_id = %profile.id, "candidate embedding failed: {e}");
                None
            }
        }
    }

    /// Semantic similarity enters the composite only when both vectors
    /// exist; otherwise the sub-score is omitted entirely.
    async fn score(
        &self,
        profile: &CandidateProfile,
        job_description: &str,
        candidate_vector: Option<&[f32]>,
    ) -> MatchResult {
        let semantic = match candidate_vector {
            Some(vector) => match self.embeddings.embed(job_description).await {
                Ok(query_vector) => {
                    Some(crate::index::cosine_unit_interval(vector, &query_vector) as f64)
                }
                Err(e) => {
                    warn!("job description embedding failed: {e}");
                    None
                }
            },
            None => None,
        };

        let weights = self.ranking.current_weights().await;
        matching::score(profile, job_description, semantic, weights)
    }
}
