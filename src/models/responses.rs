//! Response DTOs for the scraping API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::cache::CacheStats;
use crate::export::ExportFormat;
use crate::jobs::{JobRecord, JobStats, JobStatus};
use crate::scrape::{Repository, UserProfile};

// == Job Response ==
/// Full job record as exposed to API callers.
#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub progress: u8,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub export_files: Vec<String>,
    pub cancel_requested: bool,
}

impl From<JobRecord> for JobResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: record.id,
            status: record.status,
            subject: record.subject,
            created_at: record.created_at,
            updated_at: record.updated_at,
            progress: record.progress,
            result: record.result,
            error: record.error,
            export_files: record.export_files,
            cancel_requested: record.cancel_requested,
        }
    }
}

// == Job Submit Response ==
/// Returned by async scrape submission.
#[derive(Debug, Clone, Serialize)]
pub struct JobSubmitResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub status_url: String,
}

impl JobSubmitResponse {
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            status_url: format!("/jobs/{}", job_id),
        }
    }
}

// == Profile Response ==
/// Synchronous profile read, with cache provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub cached: bool,
    pub profile: UserProfile,
}

// == Repositories Response ==
/// Synchronous repositories read, with cache provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ReposResponse {
    pub username: String,
    pub cached: bool,
    pub total_repos: usize,
    pub repositories: Vec<Repository>,
}

// == Cache Stats Response ==
/// Cache counters for the stats endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
        }
    }
}

// == Stats Response ==
/// Combined process statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStatsResponse,
    pub jobs: JobStats,
}

// == Invalidate Response ==
/// Result of a cache invalidation; absence is not an error.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub key: String,
    pub removed: bool,
}

// == Export Response ==
/// Files produced by one export invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ExportResponse {
    pub job_id: Uuid,
    pub format: ExportFormat,
    pub files: Vec<String>,
}

// == Export Files Response ==
/// All files previously produced for a job.
#[derive(Debug, Clone, Serialize)]
pub struct ExportFilesResponse {
    pub job_id: Uuid,
    pub files: Vec<String>,
    pub total_files: usize,
}

// == Message Response ==
/// Generic acknowledgement body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// == Health Response ==
/// Health check body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub cache_entries: usize,
    pub total_jobs: usize,
}

impl HealthResponse {
    pub fn healthy(cache_entries: usize, total_jobs: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            cache_entries,
            total_jobs,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::ScrapeParams;

    #[test]
    fn test_job_response_from_record() {
        let record = JobRecord::new("octocat".to_string(), ScrapeParams::default());
        let id = record.id;

        let resp = JobResponse::from(record);
        assert_eq!(resp.job_id, id);
        assert_eq!(resp.status, JobStatus::Pending);
        assert_eq!(resp.subject, "octocat");
        assert_eq!(resp.progress, 0);
    }

    #[test]
    fn test_submit_response_links_status_url() {
        let id = Uuid::new_v4();
        let resp = JobSubmitResponse::new(id);
        assert_eq!(resp.status, JobStatus::Pending);
        assert_eq!(resp.status_url, format!("/jobs/{}", id));
    }

    #[test]
    fn test_cache_stats_response_hit_rate() {
        let mut stats = CacheStats::new();
        for _ in 0..8 {
            stats.record_hit();
        }
        for _ in 0..2 {
            stats.record_miss();
        }

        let resp = CacheStatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(3, 7);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(json.contains("\"cache_entries\":3"));
    }

    #[test]
    fn test_export_format_serializes_lowercase() {
        let resp = ExportResponse {
            job_id: Uuid::new_v4(),
            format: ExportFormat::Csv,
            files: vec!["a.csv".to_string()],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"format\":\"csv\""));
    }
}
