use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateProfile;
use crate::pipeline::{BatchItem, BatchOutcome, IngestError, IngestOutcome, SearchHit};
use crate::sources::Source;
use crate::state::AppState;

const MAX_TOP_K: usize = 50;

#[derive(Serialize)]
pub struct ParseSourcesResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub recruiter_id: String,
    pub job_description: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub status: &'static str,
    pub total: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Deserialize)]
pub struct RecruiterIdQuery {
    pub recruiter_id: String,
}

/// Fields parsed out of a multipart ingestion request. Unknown field names
/// are ignored rather than rejected.
struct IngestForm {
    sources: Vec<Source>,
    files: Vec<BatchItem>,
    job_description: Option<String>,
    recruiter_id: Option<String>,
}

async fn read_form(multipart: &mut Multipart) -> Result<IngestForm, AppError> {
    let mut form = IngestForm {
        sources: Vec::new(),
        files: Vec::new(),
        job_description: None,
        recruiter_id: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" | "files" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
                form.sources.push(Source::new(filename.clone(), Some(data.clone())));
                form.files.push(BatchItem { filename, data });
            }
            "linkedin_url" | "github_url" => {
                let value = read_text(field, &name).await?;
                let value = value.trim();
                if !value.is_empty() {
                    form.sources.push(Source::new(value, None));
                }
            }
            "raw_text" => {
                let value = read_text(field, &name).await?;
                if !value.trim().is_empty() {
                    form.sources.push(Source::new("raw_text", Some(Bytes::from(value))));
                }
            }
            "job_description" => {
                let value = read_text(field, &name).await?;
                if !value.trim().is_empty() {
                    form.job_description = Some(value);
                }
            }
            "recruiter_id" => {
                let value = read_text(field, &name).await?;
                let value = value.trim();
                if !value.is_empty() {
                    form.recruiter_id = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))
}

/// POST /api/v1/candidates/parse-sources
/// Ingests one candidate from any mix of uploads, profile URLs, and pasted
/// text, all merged into a single profile.
pub async fn handle_parse_sources(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParseSourcesResponse>, AppError> {
    let form = read_form(&mut multipart).await?;

    let recruiter_id = form
        .recruiter_id
        .ok_or_else(|| AppError::Validation("'recruiter_id' field is required".to_string()))?;
    if form.sources.is_empty() {
        return Err(AppError::Validation(
            "At least one source is required: 'file', 'linkedin_url', 'github_url', or 'raw_text'"
                .to_string(),
        ));
    }

    let outcome = state
        .pipeline
        .ingest_with_timeout(form.sources, form.job_description.as_deref(), &recruiter_id)
        .await
        .map_err(ingest_error_to_app)?;

    Ok(Json(ParseSourcesResponse { status: "success", outcome }))
}

/// POST /api/v1/candidates/batch
/// Ingests each uploaded file as its own candidate through the worker pool.
pub async fn handle_batch_ingest(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, AppError> {
    let form = read_form(&mut multipart).await?;

    let recruiter_id = form
        .recruiter_id
        .ok_or_else(|| AppError::Validation("'recruiter_id' field is required".to_string()))?;
    if form.files.is_empty() {
        return Err(AppError::Validation(
            "At least one 'files' upload is required".to_string(),
        ));
    }

    let outcome = state
        .pipeline
        .ingest_batch(form.files, form.job_description.as_deref(), &recruiter_id)
        .await;

    if outcome.successful == 0 {
        return Err(AppError::UnprocessableEntity(
            serde_json::to_string(&outcome).unwrap_or_default(),
        ));
    }

    let message = format!("Processed {} of {} file(s).", outcome.successful, outcome.total);
    Ok(Json(BatchResponse { status: "success", message, outcome }))
}

/// POST /api/v1/candidates/search
/// Semantic search over the recruiter's indexed candidates.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let recruiter_id = req.recruiter_id.trim();
    if recruiter_id.is_empty() {
        return Err(AppError::Validation("'recruiter_id' must not be empty".to_string()));
    }
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation("'job_description' must not be empty".to_string()));
    }
    if req.top_k == 0 || req.top_k > MAX_TOP_K {
        return Err(AppError::Validation(format!(
            "'top_k' must be between 1 and {MAX_TOP_K}"
        )));
    }

    let results = state.pipeline.search(recruiter_id, &req.job_description, req.top_k).await?;
    Ok(Json(SearchResponse { status: "success", total: results.len(), results }))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RecruiterIdQuery>,
) -> Result<Json<CandidateProfile>, AppError> {
    let recruiter_id = params.recruiter_id.trim();
    if recruiter_id.is_empty() {
        return Err(AppError::Validation("'recruiter_id' must not be empty".to_string()));
    }

    let profile = state
        .repository
        .find(recruiter_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
    Ok(Json(profile))
}

fn ingest_error_to_app(err: IngestError) -> AppError {
    let rate_limited = err.is_rate_limited();
    match err {
        IngestError::NoUsableText { failures } => {
            let summary = if failures.is_empty() {
                "no sources were supplied".to_string()
            } else {
                failures
                    .iter()
                    .map(|f| format!("{} ({})", f.reference, f.code))
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            if rate_limited {
                AppError::UpstreamRateLimited(format!(
                    "Source fetching was rate limited, retry later: {summary}"
                ))
            } else {
                AppError::UnprocessableEntity(format!(
                    "No usable text from any supplied source: {summary}"
                ))
            }
        }
        IngestError::Timeout(duration) => {
            AppError::Internal(anyhow::anyhow!("ingestion timed out after {duration:?}"))
        }
        IngestError::Internal(e) => AppError::Internal(e),
    }
}
