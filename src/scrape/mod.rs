//! Scrape Module
//!
//! Outbound GitHub API client: profile fetch, paginated repository
//! listing, README retrieval, and the aggregated complete scrape driven by
//! background jobs.

mod client;
mod types;

pub use client::GithubClient;
pub use types::{Repository, ScrapeParams, ScrapeReport, UserProfile};

use thiserror::Error;

// == Scrape Error ==
/// Failures of the outbound scrape operation.
///
/// On background jobs these are captured on the job record; on the
/// synchronous paths they convert into the API error.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// The requested user does not exist upstream
    #[error("user not found: {0}")]
    SubjectNotFound(String),

    /// Upstream rate limit exceeded or access forbidden
    #[error("rate limit exceeded or access forbidden")]
    RateLimited,

    /// Any other non-success upstream response
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Transport-level failure (connect, timeout, body read)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The aggregated report could not be encoded as JSON
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    /// The operation observed its cancellation signal at a checkpoint
    #[error("operation cancelled")]
    Cancelled,
}

impl From<ScrapeError> for crate::error::ApiError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::SubjectNotFound(user) => crate::error::ApiError::SubjectNotFound(user),
            ScrapeError::RateLimited => crate::error::ApiError::RateLimited,
            other => crate::error::ApiError::Upstream(other.to_string()),
        }
    }
}
