use std::sync::Arc;

use crate::config::Config;
use crate::index::embeddings::EmbeddingClient;
use crate::index::VectorIndex;
use crate::llm_client::LlmClient;
use crate::matching::weights::AdaptiveRankingEngine;
use crate::pipeline::IngestionPipeline;
use crate::repository::ProfileRepository;

/// What this build and deployment can actually do. Reported by the health
/// endpoint so operators can tell a config gap from a bug.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// Whether .docx extraction was compiled in.
    pub docx: bool,
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    pub embeddings: EmbeddingClient,
    /// Pluggable vector index. Default: in-process per-tenant store.
    pub index: Arc<dyn VectorIndex>,
    /// Pluggable profile store. Postgres when DATABASE_URL is set, in-memory
    /// otherwise.
    pub repository: Arc<dyn ProfileRepository>,
    pub ranking: Arc<AdaptiveRankingEngine>,
    pub pipeline: Arc<IngestionPipeline>,
    pub capabilities: Capabilities,
}
