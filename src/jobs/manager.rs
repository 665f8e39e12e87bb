//! Job Manager Module
//!
//! Creates, tracks, transitions, cancels, lists, and garbage-collects job
//! records, and drives execution of the scrape operation for each job.
//!
//! Concurrency model: one `RwLock` boundary around the record map
//! linearizes all record updates; the spawned execution task is the single
//! writer of a record's status/result/error/progress, while readers clone
//! snapshots. Running jobs are bounded by a semaphore; excess jobs stay
//! `Pending` in FIFO submission order.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{RwLock, Semaphore};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::jobs::{JobContext, JobMap, JobRecord, JobStatus, Scraper};
use crate::scrape::{ScrapeError, ScrapeParams};

// == Job Stats ==
/// Per-status job counts for the stats endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

// == Execution Outcome ==
/// What the watchdog-wrapped scrape call resolved to.
enum Outcome {
    Completed(Value),
    Failed(String),
    TimedOut,
    Cancelled,
}

// == Job Manager ==
/// Manager for background scraping jobs.
pub struct JobManager {
    /// All tracked records
    jobs: Arc<RwLock<JobMap>>,
    /// Cancellation tokens of non-terminal jobs
    tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// The external scrape operation
    scraper: Arc<dyn Scraper>,
    /// Concurrency bound on running jobs
    permits: Arc<Semaphore>,
    /// Watchdog timeout per job execution
    exec_timeout: Duration,
    /// Where export files live, for deletion alongside their records
    output_dir: PathBuf,
}

impl JobManager {
    // == Constructor ==
    /// Creates a new JobManager around the given scrape operation.
    pub fn new(scraper: Arc<dyn Scraper>, config: &Config) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tokens: Arc::new(RwLock::new(HashMap::new())),
            scraper,
            permits: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            exec_timeout: Duration::from_secs(config.job_timeout),
            output_dir: config.output_dir.clone(),
        }
    }

    // == Submit ==
    /// Allocates a new `Pending` record and schedules its execution.
    ///
    /// Returns immediately with the job id; the submitting caller never
    /// blocks on the work itself.
    pub async fn submit(&self, subject: String, params: ScrapeParams) -> Uuid {
        let record = JobRecord::new(subject, params);
        let id = record.id;
        let token = CancellationToken::new();

        self.jobs.write().await.insert(id, record);
        self.tokens.write().await.insert(id, token.clone());

        let jobs = self.jobs.clone();
        let tokens = self.tokens.clone();
        let scraper = self.scraper.clone();
        let permits = self.permits.clone();
        let exec_timeout = self.exec_timeout;

        tokio::spawn(async move {
            execute(jobs, tokens, scraper, permits, exec_timeout, id, token).await;
        });

        debug!(job_id = %id, "Job submitted");
        id
    }

    // == Get ==
    /// Returns a snapshot of the record, or None for an unknown id.
    pub async fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(&id).cloned()
    }

    // == List ==
    /// Lists records newest-first by creation time, optionally filtered by
    /// status, capped at `limit`.
    pub async fn list(&self, status: Option<JobStatus>, limit: usize) -> Vec<JobRecord> {
        let map = self.jobs.read().await;
        let mut records: Vec<JobRecord> = map
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        records
    }

    // == Cancel ==
    /// Requests cancellation of a job.
    ///
    /// A `Pending` job transitions directly to `Cancelled` without ever
    /// entering `Running`; a `Running` job has its token fired and reaches
    /// `Cancelled` at the execution path's next checkpoint.
    pub async fn cancel(&self, id: Uuid) -> Result<()> {
        {
            let mut map = self.jobs.write().await;
            let record = map
                .get_mut(&id)
                .ok_or_else(|| ApiError::NotFound(format!("Job not found: {id}")))?;

            if record.status.is_terminal() {
                return Err(ApiError::AlreadyTerminal(format!(
                    "Job {id} is already {}",
                    record.status
                )));
            }

            record.cancel_requested = true;
            if record.status == JobStatus::Pending {
                record.cancel();
            } else {
                record.touch();
            }
        }

        if let Some(token) = self.tokens.read().await.get(&id) {
            token.cancel();
        }

        info!(job_id = %id, "Cancellation requested");
        Ok(())
    }

    // == Delete ==
    /// Removes a record and its export files.
    ///
    /// A `Running` job cannot be deleted (`JobBusy`); cancel it first. A
    /// `Pending` job is cancelled on the way out so its queued execution
    /// task exits without side effects.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let record = {
            let mut map = self.jobs.write().await;
            match map.get(&id).map(|r| r.status) {
                None => return Err(ApiError::NotFound(format!("Job not found: {id}"))),
                Some(JobStatus::Running) => {
                    return Err(ApiError::JobBusy(format!(
                        "Job {id} is running; cancel it before deleting"
                    )));
                }
                Some(_) => map.remove(&id),
            }
        };
        let Some(record) = record else {
            return Err(ApiError::NotFound(format!("Job not found: {id}")));
        };

        if let Some(token) = self.tokens.write().await.remove(&id) {
            token.cancel();
        }

        self.remove_export_files(&record.export_files).await;
        info!(job_id = %id, "Job deleted");
        Ok(())
    }

    // == Cleanup ==
    /// Removes all terminal records whose `updated_at` is older than the
    /// retention period, along with their export files.
    ///
    /// Returns the number of records removed.
    pub async fn cleanup(&self, retention: Duration) -> usize {
        let cutoff = Utc::now() - chrono::Duration::seconds(retention.as_secs() as i64);

        let removed: Vec<JobRecord> = {
            let mut map = self.jobs.write().await;
            let stale: Vec<Uuid> = map
                .values()
                .filter(|r| r.status.is_terminal() && r.updated_at < cutoff)
                .map(|r| r.id)
                .collect();

            stale.iter().filter_map(|id| map.remove(id)).collect()
        };

        for record in &removed {
            self.remove_export_files(&record.export_files).await;
        }

        if !removed.is_empty() {
            info!("Job cleanup: removed {} old jobs", removed.len());
        }
        removed.len()
    }

    // == Stats ==
    /// Returns total and per-status job counts.
    pub async fn stats(&self) -> JobStats {
        let map = self.jobs.read().await;
        let mut stats = JobStats {
            total: map.len(),
            ..Default::default()
        };

        for record in map.values() {
            match record.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    // == Append Export Files ==
    /// Records produced export files on a job; the export coordinator's
    /// only write path into the record.
    pub async fn append_export_files(&self, id: Uuid, files: &[String]) -> Result<()> {
        let mut map = self.jobs.write().await;
        let record = map
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Job not found: {id}")))?;

        record.export_files.extend(files.iter().cloned());
        record.touch();
        Ok(())
    }

    async fn remove_export_files(&self, files: &[String]) {
        for name in files {
            let path = self.output_dir.join(name);
            if let Err(err) = tokio::fs::remove_file(&path).await {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(file = %path.display(), %err, "Failed to remove export file");
                }
            }
        }
    }
}

// == Execution Path ==
/// Drives one job: admission under the concurrency bound, the watchdog-
/// wrapped scrape call, and application of the outcome to the record.
///
/// This task is the record's single writer between `Running` and its
/// terminal state; a cancel-of-pending or delete that happened while the
/// job sat in the queue makes it exit without touching anything.
async fn execute(
    jobs: Arc<RwLock<JobMap>>,
    tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    scraper: Arc<dyn Scraper>,
    permits: Arc<Semaphore>,
    exec_timeout: Duration,
    id: Uuid,
    token: CancellationToken,
) {
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return, // semaphore closed during shutdown
    };

    let started = {
        let mut map = jobs.write().await;
        match map.get_mut(&id) {
            Some(record) if record.status == JobStatus::Pending => {
                record.start();
                Some((record.subject.clone(), record.params.clone()))
            }
            _ => None,
        }
    };

    let Some((subject, params)) = started else {
        tokens.write().await.remove(&id);
        return;
    };

    info!(job_id = %id, subject = %subject, "Job running");
    let ctx = JobContext::new(token.clone(), jobs.clone(), id);

    let outcome = match timeout(exec_timeout, scraper.scrape(&subject, &params, &ctx)).await {
        Err(_) => Outcome::TimedOut,
        // A result that arrives after cancellation was requested is
        // discarded: the job must never reach Completed past a cancel.
        Ok(Ok(_)) if token.is_cancelled() => Outcome::Cancelled,
        Ok(Ok(result)) => Outcome::Completed(result),
        Ok(Err(ScrapeError::Cancelled)) => Outcome::Cancelled,
        Ok(Err(_)) if token.is_cancelled() => Outcome::Cancelled,
        Ok(Err(err)) => Outcome::Failed(err.to_string()),
    };

    {
        let mut map = jobs.write().await;
        if let Some(record) = map.get_mut(&id) {
            if !record.status.is_terminal() {
                match outcome {
                    Outcome::Completed(result) => {
                        record.complete(result);
                        info!(job_id = %id, "Job completed");
                    }
                    Outcome::Failed(msg) => {
                        warn!(job_id = %id, error = %msg, "Job failed");
                        record.fail(msg);
                    }
                    Outcome::TimedOut => {
                        let msg =
                            format!("execution exceeded {}s timeout", exec_timeout.as_secs());
                        warn!(job_id = %id, "Job timed out");
                        record.fail(msg);
                    }
                    Outcome::Cancelled => {
                        record.cancel();
                        info!(job_id = %id, "Job cancelled");
                    }
                }
            }
        }
    }

    tokens.write().await.remove(&id);
}
