//! Export Module
//!
//! Materializes completed scrape results as files on disk and records the
//! produced references back on the owning job.

mod coordinator;
mod exporter;

pub use coordinator::ExportCoordinator;
pub use exporter::Exporter;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// == Export Format ==
/// The fixed set of supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One pretty-printed report file
    Json,
    /// A profile file plus a repositories file
    Csv,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Csv => f.write_str("csv"),
        }
    }
}

// == Export Error ==
/// Failures while producing export files.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Filesystem failure writing a file
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored job result does not decode as a scrape report
    #[error("malformed result payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<ExportError> for crate::error::ApiError {
    fn from(err: ExportError) -> Self {
        crate::error::ApiError::ExportFailed(err.to_string())
    }
}
