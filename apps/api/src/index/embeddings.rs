// Embedding provider client. Speaks the OpenAI embeddings API; like the LLM
// client, the key is optional and its absence turns the capability off
// rather than failing startup.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const EMBEDDINGS_API_URL: &str = "https://api.openai.com/v1/embeddings";
/// Model used for candidate and job-description vectors.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Dimensionality of the vectors the model returns.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("no embedding API key configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding response contained no vectors")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    api_key: Option<String>,
}

impl EmbeddingClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Whether an embedding API key was supplied at startup.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Embeds one text. No retry loop: callers treat a failure as the
    /// capability being unavailable for this request.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let Some(api_key) = &self.api_key else {
            return Err(EmbeddingError::NotConfigured);
        };

        let response = self
            .client
            .post(EMBEDDINGS_API_URL)
            .bearer_auth(api_key)
            .json(&EmbeddingRequest { model: EMBEDDING_MODEL, input: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api { status: status.as_u16(), message });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or(EmbeddingError::EmptyResponse)?;

        if vector.len() != EMBEDDING_DIMENSIONS {
            warn!(
                "embedding dimensionality changed: got {}, expected {}",
                vector.len(),
                EMBEDDING_DIMENSIONS
            );
        }
        debug!(dimensions = vector.len(), "embedding generated");
        Ok(vector)
    }
}
