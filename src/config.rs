//! Configuration Module
//!
//! Handles loading and managing server configuration from environment
//! variables, with a validation pass that is fatal at startup.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

// == Config Error ==
/// Invalid configuration detected at startup.
#[derive(Error, Debug)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);

// == Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults; only `GITHUB_TOKEN` is optional without one.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries the response cache can hold
    pub cache_max_entries: usize,
    /// Default TTL in seconds for cached responses
    pub cache_ttl: u64,
    /// Cache TTL sweep interval in seconds
    pub cache_cleanup_interval: u64,
    /// Per-job execution timeout in seconds (watchdog)
    pub job_timeout: u64,
    /// Retention period in seconds for terminal job records
    pub job_retention_secs: u64,
    /// Job retention sweep interval in seconds
    pub job_cleanup_interval: u64,
    /// Maximum number of concurrently running jobs
    pub max_concurrent_jobs: usize,
    /// Optional GitHub personal access token
    pub github_token: Option<String>,
    /// Base URL of the GitHub REST API
    pub github_api_url: String,
    /// Outbound request timeout in seconds
    pub request_timeout: u64,
    /// Default cap on repositories fetched per scrape
    pub default_max_repos: usize,
    /// Directory export files are written to
    pub output_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 3600)
    /// - `CACHE_CLEANUP_INTERVAL` - Cache sweep interval (default: 60)
    /// - `JOB_TIMEOUT` - Job watchdog timeout in seconds (default: 300)
    /// - `JOB_RETENTION_SECS` - Terminal job retention (default: 86400)
    /// - `JOB_CLEANUP_INTERVAL` - Job sweep interval (default: 3600)
    /// - `MAX_CONCURRENT_JOBS` - Running-job bound (default: 4)
    /// - `GITHUB_TOKEN` - Optional API token
    /// - `GITHUB_API_URL` - API base (default: https://api.github.com)
    /// - `REQUEST_TIMEOUT` - Outbound timeout in seconds (default: 30)
    /// - `DEFAULT_MAX_REPOS` - Repository cap per scrape (default: 100)
    /// - `OUTPUT_DIR` - Export directory (default: ./data/exports)
    pub fn from_env() -> Self {
        Self {
            server_port: parse_env("SERVER_PORT", 3000),
            cache_max_entries: parse_env("CACHE_MAX_ENTRIES", 1000),
            cache_ttl: parse_env("CACHE_TTL", 3600),
            cache_cleanup_interval: parse_env("CACHE_CLEANUP_INTERVAL", 60),
            job_timeout: parse_env("JOB_TIMEOUT", 300),
            job_retention_secs: parse_env("JOB_RETENTION_SECS", 86_400),
            job_cleanup_interval: parse_env("JOB_CLEANUP_INTERVAL", 3600),
            max_concurrent_jobs: parse_env("MAX_CONCURRENT_JOBS", 4),
            github_token: env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            request_timeout: parse_env("REQUEST_TIMEOUT", 30),
            default_max_repos: parse_env("DEFAULT_MAX_REPOS", 100),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/exports")),
        }
    }

    // == Validate ==
    /// Rejects configurations the managers cannot run with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.cache_max_entries == 0 {
            return Err(ConfigError("CACHE_MAX_ENTRIES must be at least 1".into()));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError("MAX_CONCURRENT_JOBS must be at least 1".into()));
        }
        if self.job_timeout == 0 {
            return Err(ConfigError("JOB_TIMEOUT must be at least 1 second".into()));
        }
        if self.cache_ttl == 0 {
            return Err(ConfigError("CACHE_TTL must be at least 1 second".into()));
        }
        if self.github_api_url.is_empty() {
            return Err(ConfigError("GITHUB_API_URL must not be empty".into()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError("OUTPUT_DIR must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_max_entries: 1000,
            cache_ttl: 3600,
            cache_cleanup_interval: 60,
            job_timeout: 300,
            job_retention_secs: 86_400,
            job_cleanup_interval: 3600,
            max_concurrent_jobs: 4,
            github_token: None,
            github_api_url: "https://api.github.com".to_string(),
            request_timeout: 30,
            default_max_repos: 100,
            output_dir: PathBuf::from("./data/exports"),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_ttl, 3600);
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(config.job_timeout, 300);
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_config_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_cache_capacity() {
        let config = Config {
            cache_max_entries: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            max_concurrent_jobs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            job_timeout: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_api_url() {
        let config = Config {
            github_api_url: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
