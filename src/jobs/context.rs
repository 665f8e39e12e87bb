//! Job Context Module
//!
//! The capability handed to an executing scrape operation: a cooperative
//! cancellation signal plus a progress reporter writing back onto the
//! owning job record.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::record::JobMap;

// == Job Context ==
/// Execution context for one running job.
///
/// The scrape operation checks `is_cancelled` at its own checkpoints and
/// reports coarse progress milestones; it never touches the record
/// directly.
#[derive(Clone)]
pub struct JobContext {
    cancel: CancellationToken,
    jobs: Arc<RwLock<JobMap>>,
    job_id: Uuid,
}

impl JobContext {
    pub(crate) fn new(cancel: CancellationToken, jobs: Arc<RwLock<JobMap>>, job_id: Uuid) -> Self {
        Self {
            cancel,
            jobs,
            job_id,
        }
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The id of the job this context belongs to.
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    // == Report Progress ==
    /// Records a progress milestone on the job record.
    ///
    /// Progress is monotonic non-decreasing and only applied while the job
    /// is running, so late or out-of-order reports cannot corrupt the
    /// record.
    pub async fn report_progress(&self, pct: u8) {
        let mut jobs = self.jobs.write().await;
        if let Some(record) = jobs.get_mut(&self.job_id) {
            record.advance_progress(pct);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::record::JobRecord;
    use crate::scrape::ScrapeParams;
    use std::collections::HashMap;

    fn context_with_record() -> (JobContext, Arc<RwLock<JobMap>>, Uuid) {
        let mut record = JobRecord::new("octocat".to_string(), ScrapeParams::default());
        record.start();
        let id = record.id;

        let mut map = HashMap::new();
        map.insert(id, record);
        let jobs = Arc::new(RwLock::new(map));

        let ctx = JobContext::new(CancellationToken::new(), jobs.clone(), id);
        (ctx, jobs, id)
    }

    #[tokio::test]
    async fn test_report_progress_writes_record() {
        let (ctx, jobs, id) = context_with_record();

        ctx.report_progress(40).await;

        let map = jobs.read().await;
        assert_eq!(map.get(&id).unwrap().progress, 40);
    }

    #[tokio::test]
    async fn test_report_progress_is_monotonic() {
        let (ctx, jobs, id) = context_with_record();

        ctx.report_progress(60).await;
        ctx.report_progress(20).await;

        let map = jobs.read().await;
        assert_eq!(map.get(&id).unwrap().progress, 60);
    }

    #[tokio::test]
    async fn test_report_progress_missing_record_is_noop() {
        let jobs: Arc<RwLock<JobMap>> = Arc::new(RwLock::new(HashMap::new()));
        let ctx = JobContext::new(CancellationToken::new(), jobs, Uuid::new_v4());

        // Record deleted while the task was queued; nothing to update.
        ctx.report_progress(50).await;
    }

    #[tokio::test]
    async fn test_cancellation_flag() {
        let token = CancellationToken::new();
        let jobs: Arc<RwLock<JobMap>> = Arc::new(RwLock::new(HashMap::new()));
        let ctx = JobContext::new(token.clone(), jobs, Uuid::new_v4());

        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
