//! Request DTOs for the scraping API
//!
//! Defines the structure of incoming query parameters.

use serde::Deserialize;

use crate::jobs::JobStatus;
use crate::scrape::ScrapeParams;

/// Upper bound accepted for `max_repos`
const MAX_REPOS_LIMIT: usize = 500;

/// Upper bound accepted for job list `limit`
const LIST_LIMIT_MAX: usize = 1000;

// == Scrape Query ==
/// Query parameters for synchronous repository reads and async scrape
/// submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeQuery {
    /// Maximum repositories to fetch (default from configuration)
    #[serde(default)]
    pub max_repos: Option<usize>,
    /// Include README content (default: true)
    #[serde(default)]
    pub include_readme: Option<bool>,
    /// Truncate README content (default: true)
    #[serde(default)]
    pub truncate_readme: Option<bool>,
}

impl ScrapeQuery {
    /// Validates the query data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self.max_repos {
            Some(0) => Some("max_repos must be at least 1".to_string()),
            Some(n) if n > MAX_REPOS_LIMIT => {
                Some(format!("max_repos must not exceed {}", MAX_REPOS_LIMIT))
            }
            _ => None,
        }
    }

    /// Resolves the query into scrape parameters, filling defaults.
    pub fn into_params(self, default_max_repos: usize) -> ScrapeParams {
        ScrapeParams {
            max_repos: self.max_repos.unwrap_or(default_max_repos),
            include_readme: self.include_readme.unwrap_or(true),
            truncate_readme: self.truncate_readme.unwrap_or(true),
        }
    }
}

// == Job List Query ==
/// Query parameters for listing jobs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListQuery {
    /// Optional status filter
    #[serde(default)]
    pub status: Option<JobStatus>,
    /// Maximum number of jobs to return (default 100, capped at 1000)
    #[serde(default)]
    pub limit: Option<usize>,
}

impl JobListQuery {
    /// Effective limit with default and cap applied.
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(100).min(LIST_LIMIT_MAX)
    }
}
