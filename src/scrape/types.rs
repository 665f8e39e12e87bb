//! Scrape data types
//!
//! DTOs for GitHub API payloads and the aggregated scrape report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// == Scrape Params ==
/// Validated options for one scrape operation.
///
/// Stored verbatim on the job record; the job manager never interprets
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeParams {
    /// Maximum repositories to fetch
    pub max_repos: usize,
    /// Whether to fetch README content per repository
    pub include_readme: bool,
    /// Whether to truncate README content
    pub truncate_readme: bool,
}

impl Default for ScrapeParams {
    fn default() -> Self {
        Self {
            max_repos: 100,
            include_readme: true,
            truncate_readme: true,
        }
    }
}

// == User Profile ==
/// GitHub user profile, as returned by `GET /users/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

// == Repository ==
/// GitHub repository, as returned by `GET /users/{username}/repos`.
///
/// Field aliases map the upstream `*_count` names onto the shorter ones
/// the rest of the crate uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default, alias = "stargazers_count")]
    pub stars: u64,
    #[serde(default, alias = "forks_count")]
    pub forks: u64,
    #[serde(default, alias = "watchers_count")]
    pub watchers: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, alias = "open_issues_count")]
    pub open_issues: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default, alias = "fork")]
    pub is_fork: bool,
    #[serde(default)]
    pub readme_content: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

// == Scrape Report ==
/// Aggregated result of a complete scrape: profile, repositories, and
/// summary statistics. Serialized to JSON as the opaque job result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    pub username: String,
    pub profile: UserProfile,
    pub repositories: Vec<Repository>,
    pub total_stars: u64,
    pub total_forks: u64,
    /// Language name → repository count
    pub top_languages: BTreeMap<String, u64>,
}

impl ScrapeReport {
    /// Builds a report from fetched parts, computing the aggregates.
    pub fn new(username: String, profile: UserProfile, repositories: Vec<Repository>) -> Self {
        let total_stars = repositories.iter().map(|r| r.stars).sum();
        let total_forks = repositories.iter().map(|r| r.forks).sum();

        let mut top_languages = BTreeMap::new();
        for repo in &repositories {
            if let Some(lang) = &repo.language {
                *top_languages.entry(lang.clone()).or_insert(0) += 1;
            }
        }

        Self {
            username,
            profile,
            repositories,
            total_stars,
            total_forks,
            top_languages,
        }
    }
}
