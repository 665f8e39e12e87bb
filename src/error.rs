//! Error types for the scraping API
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == API Error Enum ==
/// Unified error type returned by the API surface.
///
/// Failures intrinsic to a single job's execution are never represented
/// here: they are recorded on the job record and surfaced through status
/// queries instead.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Unknown job id or cache key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cancel requested on a job that already reached a terminal state
    #[error("Job already terminal: {0}")]
    AlreadyTerminal(String),

    /// Delete requested on a running job
    #[error("Job is running: {0}")]
    JobBusy(String),

    /// Export requested on a job that has not completed
    #[error("Job not ready for export: {0}")]
    JobNotReady(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The scraped subject does not exist upstream
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    /// Upstream API rate limit hit or access forbidden
    #[error("Upstream rate limit exceeded")]
    RateLimited,

    /// Upstream API failure on a synchronous scrape path
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Export file production failed
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) | ApiError::SubjectNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyTerminal(_) | ApiError::JobBusy(_) | ApiError::JobNotReady(_) => {
                StatusCode::CONFLICT
            }
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited | ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::ExportFailed(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the API surface.
pub type Result<T> = std::result::Result<T, ApiError>;
