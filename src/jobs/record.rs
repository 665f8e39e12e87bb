//! Job Record Module
//!
//! Defines the data entity for one background unit of work and its
//! lifecycle states.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::scrape::ScrapeParams;

/// Shared map of all tracked job records, keyed by id.
pub type JobMap = HashMap<Uuid, JobRecord>;

// == Job Status ==
/// Lifecycle states of a background job.
///
/// `Pending → Running → {Completed, Failed, Cancelled}`; the three
/// right-hand states are terminal and no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Returns true once no further transition can leave this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// == Job Record ==
/// One background scrape job and everything its lifecycle accumulates.
///
/// Mutated only through the manager's execution path (status, progress,
/// result, error) and the export coordinator (`export_files`); readers
/// receive clones.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    /// Unique identifier, generated at creation, immutable
    pub id: Uuid,
    /// Current lifecycle state
    pub status: JobStatus,
    /// The username being scraped
    pub subject: String,
    /// Validated scrape options, stored verbatim
    pub params: ScrapeParams,
    /// Progress percentage, 0-100, monotonic while running
    pub progress: u8,
    /// Scrape result payload, set only on completion
    pub result: Option<Value>,
    /// Failure message, set only on failure
    pub error: Option<String>,
    /// Export file names in append order
    pub export_files: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last state or field change
    pub updated_at: DateTime<Utc>,
    /// Set when cancellation has been requested on a running job
    pub cancel_requested: bool,
}

impl JobRecord {
    // == Constructor ==
    /// Creates a new record in `Pending` state.
    pub fn new(subject: String, params: ScrapeParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            subject,
            params,
            progress: 0,
            result: None,
            error: None,
            export_files: Vec::new(),
            created_at: now,
            updated_at: now,
            cancel_requested: false,
        }
    }

    /// Refreshes `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // == Transitions ==
    /// `Pending → Running`.
    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.touch();
    }

    /// `Running → Completed` with the result payload attached.
    pub fn complete(&mut self, result: Value) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.touch();
    }

    /// `Running → Failed` with a descriptive message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.touch();
    }

    /// `Pending|Running → Cancelled`.
    pub fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
        self.touch();
    }

    /// Raises `progress`; regressions and post-terminal updates are ignored.
    pub fn advance_progress(&mut self, pct: u8) {
        if self.status == JobStatus::Running && pct > self.progress {
            self.progress = pct.min(100);
            self.touch();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> JobRecord {
        JobRecord::new("octocat".to_string(), ScrapeParams::default())
    }

    #[test]
    fn test_new_record_is_pending() {
        let rec = record();
        assert_eq!(rec.status, JobStatus::Pending);
        assert_eq!(rec.progress, 0);
        assert!(rec.result.is_none());
        assert!(rec.error.is_none());
        assert!(rec.export_files.is_empty());
        assert!(!rec.cancel_requested);
        assert_eq!(rec.created_at, rec.updated_at);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_complete_sets_progress_and_result() {
        let mut rec = record();
        rec.start();
        rec.complete(json!({"username": "octocat"}));

        assert_eq!(rec.status, JobStatus::Completed);
        assert_eq!(rec.progress, 100);
        assert!(rec.result.is_some());
    }

    #[test]
    fn test_fail_sets_error() {
        let mut rec = record();
        rec.start();
        rec.fail("upstream exploded");

        assert_eq!(rec.status, JobStatus::Failed);
        assert_eq!(rec.error.as_deref(), Some("upstream exploded"));
    }

    #[test]
    fn test_progress_is_monotonic_while_running() {
        let mut rec = record();
        rec.start();

        rec.advance_progress(40);
        rec.advance_progress(10);
        assert_eq!(rec.progress, 40);

        rec.advance_progress(90);
        assert_eq!(rec.progress, 90);
    }

    #[test]
    fn test_progress_ignored_when_not_running() {
        let mut rec = record();
        rec.advance_progress(50);
        assert_eq!(rec.progress, 0);

        rec.start();
        rec.cancel();
        rec.advance_progress(50);
        assert_eq!(rec.progress, 0);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(JobStatus::Running.to_string(), "running");
    }
}
