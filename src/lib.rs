//! Hubscrape - GitHub profile scraping API
//!
//! Exposes scraping of GitHub profile and repository data over HTTP, with
//! synchronous cache-backed reads, asynchronous background jobs, and
//! multi-format export of completed results.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod jobs;
pub mod models;
pub mod scrape;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cache_cleanup_task, spawn_job_cleanup_task};
