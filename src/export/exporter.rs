//! Exporter Module
//!
//! Pure file production: turns a scrape report into JSON or CSV files
//! under the configured output directory. Filenames are prefixed with the
//! job id so one job's files never collide with another's.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::export::{ExportError, ExportFormat};
use crate::scrape::{Repository, ScrapeReport, UserProfile};

// == Exporter ==
/// Writes export files for completed scrape results.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Absolute path of a produced file.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    // == Export ==
    /// Produces the files for one format and returns their names in
    /// creation order.
    pub async fn export(
        &self,
        job_id: Uuid,
        result: &Value,
        format: ExportFormat,
    ) -> Result<Vec<String>, ExportError> {
        let report: ScrapeReport = serde_json::from_value(result.clone())?;
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let files = match format {
            ExportFormat::Json => self.export_json(job_id, &report).await?,
            ExportFormat::Csv => self.export_csv(job_id, &report).await?,
        };

        debug!(job_id = %job_id, %format, count = files.len(), "Export files written");
        Ok(files)
    }

    async fn export_json(
        &self,
        job_id: Uuid,
        report: &ScrapeReport,
    ) -> Result<Vec<String>, ExportError> {
        let name = format!("{}_{}_data.json", job_id, report.username);
        let body = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(self.file_path(&name), body).await?;
        Ok(vec![name])
    }

    async fn export_csv(
        &self,
        job_id: Uuid,
        report: &ScrapeReport,
    ) -> Result<Vec<String>, ExportError> {
        let profile_name = format!("{}_{}_profile.csv", job_id, report.username);
        let repos_name = format!("{}_{}_repositories.csv", job_id, report.username);

        tokio::fs::write(
            self.file_path(&profile_name),
            profile_csv(&report.profile),
        )
        .await?;
        tokio::fs::write(
            self.file_path(&repos_name),
            repositories_csv(&report.repositories),
        )
        .await?;

        Ok(vec![profile_name, repos_name])
    }
}

// == CSV Rendering ==
// Two flat files, mirroring the report's profile/repositories split.

fn profile_csv(profile: &UserProfile) -> String {
    let header = [
        "Username",
        "Name",
        "Bio",
        "Company",
        "Location",
        "Email",
        "Blog",
        "Twitter",
        "Public Repos",
        "Public Gists",
        "Followers",
        "Following",
        "Created At",
        "Updated At",
        "Profile URL",
    ];
    let row = [
        profile.login.clone(),
        profile.name.clone().unwrap_or_default(),
        profile.bio.clone().unwrap_or_default(),
        profile.company.clone().unwrap_or_default(),
        profile.location.clone().unwrap_or_default(),
        profile.email.clone().unwrap_or_default(),
        profile.blog.clone().unwrap_or_default(),
        profile.twitter_username.clone().unwrap_or_default(),
        profile.public_repos.to_string(),
        profile.public_gists.to_string(),
        profile.followers.to_string(),
        profile.following.to_string(),
        profile.created_at.clone(),
        profile.updated_at.clone(),
        profile.html_url.clone(),
    ];

    format!("{}\n{}\n", csv_row(&header), csv_row(&row))
}

fn repositories_csv(repositories: &[Repository]) -> String {
    let header = [
        "Repository Name",
        "Description",
        "URL",
        "Stars",
        "Forks",
        "Watchers",
        "Language",
        "Open Issues",
        "Created At",
        "Updated At",
        "Size (KB)",
        "Default Branch",
        "Is Fork",
        "README Content",
    ];

    let mut out = csv_row(&header);
    out.push('\n');

    for repo in repositories {
        let row = [
            repo.name.clone(),
            repo.description.clone().unwrap_or_default(),
            repo.html_url.clone(),
            repo.stars.to_string(),
            repo.forks.to_string(),
            repo.watchers.to_string(),
            repo.language.clone().unwrap_or_else(|| "N/A".to_string()),
            repo.open_issues.to_string(),
            repo.created_at.clone(),
            repo.updated_at.clone(),
            repo.size.to_string(),
            repo.default_branch.clone(),
            repo.is_fork.to_string(),
            repo.readme_content.clone().unwrap_or_default(),
        ];
        out.push_str(&csv_row(&row));
        out.push('\n');
    }

    out
}

fn csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| csv_escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// RFC 4180 field escaping: quote when the field contains a delimiter,
/// quote, or newline, doubling embedded quotes.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
