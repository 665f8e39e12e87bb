//! API Handlers
//!
//! HTTP request handlers for each endpoint, plus the shared application
//! state they operate on.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::export::{ExportCoordinator, Exporter, ExportFormat};
use crate::jobs::JobManager;
use crate::models::{
    CacheStatsResponse, ExportFilesResponse, ExportResponse, HealthResponse, InvalidateResponse,
    JobListQuery, JobResponse, JobSubmitResponse, MessageResponse, ProfileResponse, ReposResponse,
    ScrapeQuery, StatsResponse,
};
use crate::scrape::GithubClient;

// == App State ==
/// Application state shared across all handlers.
///
/// The cache and the job store are the only shared mutable collections;
/// each sits behind its own synchronization boundary and is mutated only
/// through its manager's methods.
#[derive(Clone)]
pub struct AppState {
    /// Response cache for the synchronous read paths
    pub cache: Arc<RwLock<CacheStore<Value>>>,
    /// Background job manager
    pub jobs: Arc<JobManager>,
    /// Export coordinator
    pub export: Arc<ExportCoordinator>,
    /// Outbound GitHub client for synchronous reads
    pub client: Arc<GithubClient>,
    /// Default repository cap applied when a request does not set one
    pub default_max_repos: usize,
}

impl AppState {
    /// Creates a new AppState from already-built parts.
    pub fn new(
        cache: CacheStore<Value>,
        jobs: Arc<JobManager>,
        export: Arc<ExportCoordinator>,
        client: Arc<GithubClient>,
        default_max_repos: usize,
    ) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            jobs,
            export,
            client,
            default_max_repos,
        }
    }

    /// Wires the full state from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let cache = CacheStore::new(config.cache_max_entries, config.cache_ttl);
        let client = Arc::new(GithubClient::new(config)?);
        let jobs = Arc::new(JobManager::new(client.clone(), config));
        let export = Arc::new(ExportCoordinator::new(
            jobs.clone(),
            Exporter::new(config.output_dir.clone()),
        ));
        Ok(Self::new(
            cache,
            jobs,
            export,
            client,
            config.default_max_repos,
        ))
    }
}

// == Synchronous Scrape Handlers ==

/// Handler for GET /scrape/profile/:username
///
/// Cache-backed profile read: the cache is consulted before and populated
/// after the outbound fetch.
pub async fn scrape_profile_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>> {
    let key = format!("profile:{username}");

    // Write lock even for the read: a hit touches the recency order
    {
        let mut cache = state.cache.write().await;
        if let Some(value) = cache.get(&key) {
            let profile = serde_json::from_value(value)
                .map_err(|err| ApiError::Internal(format!("corrupt cache entry: {err}")))?;
            return Ok(Json(ProfileResponse {
                username,
                cached: true,
                profile,
            }));
        }
    }

    let profile = state.client.get_user_profile(&username).await?;
    let value = serde_json::to_value(&profile)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    state.cache.write().await.put(key, value, None)?;

    Ok(Json(ProfileResponse {
        username,
        cached: false,
        profile,
    }))
}

/// Handler for GET /scrape/repos/:username
///
/// Cache-backed repository listing; `max_repos` participates in the cache
/// key since it changes the payload.
pub async fn scrape_repos_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<ReposResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }
    let max_repos = query.max_repos.unwrap_or(state.default_max_repos);
    let key = format!("repos:{username}:{max_repos}");

    {
        let mut cache = state.cache.write().await;
        if let Some(value) = cache.get(&key) {
            let repositories: Vec<crate::scrape::Repository> = serde_json::from_value(value)
                .map_err(|err| ApiError::Internal(format!("corrupt cache entry: {err}")))?;
            return Ok(Json(ReposResponse {
                username,
                cached: true,
                total_repos: repositories.len(),
                repositories,
            }));
        }
    }

    let repositories = state.client.get_user_repos(&username, max_repos).await?;
    let value = serde_json::to_value(&repositories)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    state.cache.write().await.put(key, value, None)?;

    Ok(Json(ReposResponse {
        username,
        cached: false,
        total_repos: repositories.len(),
        repositories,
    }))
}

// == Job Handlers ==

/// Handler for POST /scrape/async/:username
///
/// Submits a background scrape job and returns 202 immediately.
pub async fn submit_job_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<ScrapeQuery>,
) -> Result<(StatusCode, Json<JobSubmitResponse>)> {
    if username.trim().is_empty() {
        return Err(ApiError::InvalidRequest("username cannot be empty".into()));
    }
    if let Some(error_msg) = query.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let params = query.into_params(state.default_max_repos);
    let job_id = state.jobs.submit(username, params).await;

    Ok((StatusCode::ACCEPTED, Json(JobSubmitResponse::new(job_id))))
}

/// Handler for GET /jobs/:id
pub async fn get_job_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponse>> {
    let record = state
        .jobs
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {id}")))?;

    Ok(Json(JobResponse::from(record)))
}

/// Handler for GET /jobs
pub async fn list_jobs_handler(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Json<Vec<JobResponse>> {
    let records = state
        .jobs
        .list(query.status, query.effective_limit())
        .await;

    Json(records.into_iter().map(JobResponse::from).collect())
}

/// Handler for POST /jobs/:id/cancel
pub async fn cancel_job_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    state.jobs.cancel(id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Cancellation requested for job {id}"
    ))))
}

/// Handler for DELETE /jobs/:id
pub async fn delete_job_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    state.jobs.delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Job {id} deleted"))))
}

// == Export Handlers ==

/// Handler for POST /export/:id/:format
pub async fn export_handler(
    State(state): State<AppState>,
    Path((id, format)): Path<(Uuid, ExportFormat)>,
) -> Result<Json<ExportResponse>> {
    let files = state.export.export(id, format).await?;
    Ok(Json(ExportResponse {
        job_id: id,
        format,
        files,
    }))
}

/// Handler for GET /export/:id/files
pub async fn export_files_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExportFilesResponse>> {
    let files = state.export.files(id).await?;
    Ok(Json(ExportFilesResponse {
        job_id: id,
        total_files: files.len(),
        files,
    }))
}

/// Handler for GET /download/:id/:filename
pub async fn download_handler(
    State(state): State<AppState>,
    Path((id, filename)): Path<(Uuid, String)>,
) -> Result<Response> {
    let path = state.export.resolve_file(id, &filename).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|err| ApiError::Internal(format!("failed to read export file: {err}")))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

// == Cache Handlers ==

/// Handler for DELETE /cache/:key
pub async fn cache_invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.write().await.invalidate(&key);
    Json(InvalidateResponse { key, removed })
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(CacheStatsResponse::from(stats))
}

// == System Handlers ==

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await.stats();
    let jobs = state.jobs.stats().await;

    Json(StatsResponse {
        cache: CacheStatsResponse::from(cache),
        jobs,
    })
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_entries = state.cache.read().await.len();
    let total_jobs = state.jobs.stats().await.total;

    Json(HealthResponse::healthy(cache_entries, total_jobs))
}
