//! GitHub API Client
//!
//! Outbound scraper over the GitHub REST API. Each complete scrape is a
//! sequence of profile → repositories → README fetches with progress
//! milestones and cancellation checkpoints between the major steps.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::Config;
use crate::jobs::{JobContext, Scraper};
use crate::scrape::{Repository, ScrapeError, ScrapeParams, ScrapeReport, UserProfile};

/// Repositories fetched per page
const PER_PAGE: usize = 100;

/// Maximum concurrent README requests per scrape
const README_CONCURRENCY: usize = 10;

/// README content is cut here when truncation is requested
const README_TRUNCATE_LEN: usize = 1000;

// == GitHub Client ==
/// Async GitHub REST API client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GithubClient {
    // == Constructor ==
    /// Builds a client from configuration; the token, when present, is
    /// sent as an Authorization header on every request.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "application/vnd.github.v3+json".parse().expect("static header"),
        );
        if let Some(token) = &config.github_token {
            let value = format!("token {token}")
                .parse()
                .context("GITHUB_TOKEN contains invalid header characters")?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent("hubscrape/0.1")
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.github_api_url.trim_end_matches('/').to_string(),
        })
    }

    // == Get JSON ==
    /// GETs a GitHub endpoint and parses the JSON body.
    ///
    /// Returns `Ok(None)` on 404 so callers decide what absence means;
    /// 403 maps to the rate-limit error.
    async fn get_json(&self, url: &str) -> Result<Option<Value>, ScrapeError> {
        let response = self.http.get(url).send().await?;

        if let Some(remaining) = response
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            if remaining < 10 {
                warn!(remaining, "GitHub API rate limit nearly exhausted");
            }
        }

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::FORBIDDEN => Err(ScrapeError::RateLimited),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(ScrapeError::Upstream(format!("{status} from {url}"))),
        }
    }

    // == User Profile ==
    /// Fetches a user profile.
    pub async fn get_user_profile(&self, username: &str) -> Result<UserProfile, ScrapeError> {
        let url = format!("{}/users/{}", self.base_url, username);
        let body = self
            .get_json(&url)
            .await?
            .ok_or_else(|| ScrapeError::SubjectNotFound(username.to_string()))?;

        serde_json::from_value(body).map_err(ScrapeError::Encode)
    }

    // == User Repositories ==
    /// Fetches up to `max_repos` public repositories, newest-updated
    /// first, paging through the API as needed.
    pub async fn get_user_repos(
        &self,
        username: &str,
        max_repos: usize,
    ) -> Result<Vec<Repository>, ScrapeError> {
        let mut repos: Vec<Repository> = Vec::new();
        let mut page = 1;

        loop {
            let url = format!(
                "{}/users/{}/repos?page={}&per_page={}&sort=updated",
                self.base_url, username, page, PER_PAGE
            );
            let body = self
                .get_json(&url)
                .await?
                .ok_or_else(|| ScrapeError::SubjectNotFound(username.to_string()))?;

            let batch: Vec<Repository> =
                serde_json::from_value(body).map_err(ScrapeError::Encode)?;
            let batch_len = batch.len();
            repos.extend(batch);

            if repos.len() >= max_repos {
                repos.truncate(max_repos);
                break;
            }
            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(repos)
    }

    // == README ==
    /// Fetches and decodes a repository's README.
    ///
    /// Returns `Ok(None)` when the repository has none or the payload is
    /// not decodable base64.
    pub async fn get_readme(
        &self,
        username: &str,
        repo_name: &str,
    ) -> Result<Option<String>, ScrapeError> {
        let url = format!("{}/repos/{}/{}/readme", self.base_url, username, repo_name);
        let Some(body) = self.get_json(&url).await? else {
            return Ok(None);
        };

        let encoded: String = body
            .get("content")
            .and_then(|c| c.as_str())
            .map(|c| c.chars().filter(|c| !c.is_whitespace()).collect())
            .unwrap_or_default();

        match BASE64.decode(encoded) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(err) => {
                debug!(repo = repo_name, %err, "README payload is not valid base64");
                Ok(None)
            }
        }
    }

    // == Attach READMEs ==
    /// Fetches READMEs for all repositories concurrently, bounded by a
    /// semaphore, and attaches them in place.
    async fn attach_readmes(
        &self,
        username: &str,
        repos: &mut [Repository],
        truncate: bool,
    ) -> Result<(), ScrapeError> {
        let limiter = std::sync::Arc::new(Semaphore::new(README_CONCURRENCY));
        let mut tasks: JoinSet<(usize, Result<Option<String>, ScrapeError>)> = JoinSet::new();

        for (idx, repo) in repos.iter().enumerate() {
            let client = self.clone();
            let username = username.to_string();
            let repo_name = repo.name.clone();
            let limiter = limiter.clone();

            tasks.spawn(async move {
                let _permit = limiter.acquire_owned().await.ok();
                (idx, client.get_readme(&username, &repo_name).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (idx, fetched) = joined
                .map_err(|err| ScrapeError::Upstream(format!("readme task panicked: {err}")))?;
            let mut content = fetched?;

            if truncate {
                content = content.map(|text| {
                    if text.chars().count() > README_TRUNCATE_LEN {
                        let cut: String = text.chars().take(README_TRUNCATE_LEN).collect();
                        format!("{cut}...")
                    } else {
                        text
                    }
                });
            }
            repos[idx].readme_content = content;
        }

        Ok(())
    }
}

// == Scraper Implementation ==
#[async_trait]
impl Scraper for GithubClient {
    /// Complete scrape of one user: profile, repositories, READMEs, and
    /// aggregate statistics.
    ///
    /// Cancellation is checked before each major step; progress milestones
    /// are coarse by design.
    async fn scrape(
        &self,
        subject: &str,
        params: &ScrapeParams,
        ctx: &JobContext,
    ) -> Result<Value, ScrapeError> {
        if ctx.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }
        let profile = self.get_user_profile(subject).await?;
        ctx.report_progress(10).await;

        if ctx.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }
        let mut repos = self.get_user_repos(subject, params.max_repos).await?;
        ctx.report_progress(40).await;

        if params.include_readme {
            if ctx.is_cancelled() {
                return Err(ScrapeError::Cancelled);
            }
            self.attach_readmes(subject, &mut repos, params.truncate_readme)
                .await?;
        }
        ctx.report_progress(90).await;

        let report = ScrapeReport::new(subject.to_string(), profile, repos);
        Ok(serde_json::to_value(report)?)
    }
}
