//! Jobs Module
//!
//! Background job lifecycle management: creation, state transitions,
//! cancellation, progress tracking, watchdog timeout, and retention
//! cleanup. The outbound scrape itself is an opaque async operation behind
//! the [`Scraper`] trait.

mod context;
mod manager;
mod record;

pub use context::JobContext;
pub use manager::{JobManager, JobStats};
pub use record::{JobMap, JobRecord, JobStatus};

use async_trait::async_trait;
use serde_json::Value;

use crate::scrape::{ScrapeError, ScrapeParams};

// == Scraper Trait ==
/// The external scrape operation as the job manager sees it.
///
/// Exactly one call is made per job. Implementations report coarse
/// progress through the context and observe cancellation at their own
/// checkpoints, returning [`ScrapeError::Cancelled`] when they do.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(
        &self,
        subject: &str,
        params: &ScrapeParams,
        ctx: &JobContext,
    ) -> Result<Value, ScrapeError>;
}
