//! Export Coordinator Module
//!
//! Gates export on job completion, invokes the exporter, and records the
//! produced file references back onto the job record.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::export::{Exporter, ExportFormat};
use crate::jobs::{JobManager, JobStatus};

// == Export Coordinator ==
/// Ties the job manager and the exporter together.
///
/// Multiple exports of the same job in different formats are independent
/// and additive; nothing is retried internally.
pub struct ExportCoordinator {
    jobs: Arc<JobManager>,
    exporter: Exporter,
}

impl ExportCoordinator {
    pub fn new(jobs: Arc<JobManager>, exporter: Exporter) -> Self {
        Self { jobs, exporter }
    }

    // == Export ==
    /// Produces export files for a completed job and returns their names.
    pub async fn export(&self, id: Uuid, format: ExportFormat) -> Result<Vec<String>> {
        let record = self
            .jobs
            .get(id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Job not found: {id}")))?;

        if record.status != JobStatus::Completed {
            return Err(ApiError::JobNotReady(format!(
                "Job {id} is {}, export requires a completed job",
                record.status
            )));
        }
        let result = record
            .result
            .ok_or_else(|| ApiError::JobNotReady(format!("Job {id} has no result data")))?;

        let files = self.exporter.export(id, &result, format).await?;
        self.jobs.append_export_files(id, &files).await?;

        info!(job_id = %id, %format, count = files.len(), "Export completed");
        Ok(files)
    }

    // == Files ==
    /// Previously produced file references for a job, in append order.
    pub async fn files(&self, id: Uuid) -> Result<Vec<String>> {
        let record = self
            .jobs
            .get(id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Job not found: {id}")))?;
        Ok(record.export_files)
    }

    // == Resolve File ==
    /// Resolves a produced file for download, refusing names that do not
    /// belong to the job.
    pub async fn resolve_file(&self, id: Uuid, filename: &str) -> Result<PathBuf> {
        let record = self
            .jobs
            .get(id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Job not found: {id}")))?;

        if !record.export_files.iter().any(|f| f == filename) {
            return Err(ApiError::NotFound(format!(
                "File {filename} does not belong to job {id}"
            )));
        }

        let path = self.exporter.file_path(filename);
        if !path.exists() {
            return Err(ApiError::NotFound(format!("File not found: {filename}")));
        }
        Ok(path)
    }
}
