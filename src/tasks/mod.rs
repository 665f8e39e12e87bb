//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache TTL cleanup: removes expired cache entries at configured intervals
//! - Job retention cleanup: garbage-collects old terminal job records

mod cleanup;

pub use cleanup::{spawn_cache_cleanup_task, spawn_job_cleanup_task};
