mod config;
mod errors;
mod extract;
mod index;
mod llm_client;
mod matching;
mod models;
mod pipeline;
mod profile;
mod repository;
mod routes;
mod sources;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extract::Extractors;
use crate::index::embeddings::EmbeddingClient;
use crate::index::{InMemoryVectorIndex, VectorIndex};
use crate::llm_client::LlmClient;
use crate::matching::weights::AdaptiveRankingEngine;
use crate::pipeline::{IngestionPipeline, PipelineLimits};
use crate::profile::StructuredExtractor;
use crate::repository::{
    create_pool, InMemoryProfileRepository, PgProfileRepository, ProfileRepository,
};
use crate::routes::build_router;
use crate::state::{AppState, Capabilities};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sourcer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (optional; structuring degrades to heuristics)
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        info!("ANTHROPIC_API_KEY not set; structuring will use heuristics only");
    }

    // Initialize embedding client (optional; search needs it, ingestion does not)
    let embeddings = EmbeddingClient::new(config.openai_api_key.clone());
    if embeddings.is_configured() {
        info!(
            "Embedding client initialized (model: {})",
            index::embeddings::EMBEDDING_MODEL
        );
    } else {
        info!("OPENAI_API_KEY not set; indexing and semantic search are disabled");
    }

    // Initialize the profile store
    let repository: Arc<dyn ProfileRepository> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            Arc::new(PgProfileRepository::new(pool))
        }
        None => {
            info!("DATABASE_URL not set; profiles are stored in process memory");
            Arc::new(InMemoryProfileRepository::new())
        }
    };

    // Initialize the vector index
    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());

    let capabilities = Capabilities {
        docx: extract::docx::SUPPORTED,
    };
    if !capabilities.docx {
        info!("docx support not compiled in; .docx uploads will be rejected");
    }

    // Initialize the ingestion pipeline
    let extractors = Arc::new(Extractors::new(
        Duration::from_secs(config.fetch_timeout_secs),
        config.github_token.clone(),
        capabilities.docx,
    ));
    let ranking = Arc::new(AdaptiveRankingEngine::new());
    let pipeline = Arc::new(IngestionPipeline::new(
        extractors,
        StructuredExtractor::new(llm.clone()),
        embeddings.clone(),
        index.clone(),
        repository.clone(),
        ranking.clone(),
        PipelineLimits {
            worker_pool_size: config.worker_pool_size,
            extract_timeout: Duration::from_secs(config.extract_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        },
    ));
    info!(
        "Ingestion pipeline ready (worker pool: {})",
        config.worker_pool_size
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        llm,
        embeddings,
        index,
        repository,
        ranking,
        pipeline,
        capabilities,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
