use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus which providers, backends, and optional
/// capabilities this deployment is running with.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "sourcer-api",
        "providers": {
            "llm_configured": state.llm.is_configured(),
            "embeddings_configured": state.embeddings.is_configured(),
        },
        "capabilities": {
            "docx": state.capabilities.docx,
        },
        "backends": {
            "repository": state.repository.backend_name(),
            "vector_index": state.index.backend_name(),
        }
    }))
}
