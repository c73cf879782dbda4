/// Machine-readable record of a run.
///
/// A real run is silent on success, so `--report FILE` writes every outcome
/// and failure as pretty-printed JSON for later inspection.
use crate::cli::RunSummary;
use crate::error::{OrganizeError, OrganizeResult};
use crate::merger::MergeOutcome;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A file that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub error: String,
}

/// The JSON document written by `--report`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub timestamp: String,
    pub mode: &'static str,
    pub transfer: &'static str,
    pub rules: String,
    pub placed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: &'a [MergeOutcome],
    pub failures: &'a [FailureRecord],
}

impl<'a> RunReport<'a> {
    pub fn new(summary: &'a RunSummary) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            mode: summary.mode.label(),
            transfer: summary.transfer.verb(),
            rules: summary.rules.to_string(),
            placed: summary.placed_count(),
            skipped: summary.skipped_count(),
            failed: summary.failures.len(),
            outcomes: &summary.outcomes,
            failures: &summary.failures,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the report to `path`.
    pub fn save(&self, path: &Path) -> OrganizeResult<()> {
        let write_failed = |e: io::Error| OrganizeError::ReportWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };
        let json = self.to_json().map_err(|e| {
            write_failed(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            ))
        })?;
        fs::write(path, json).map_err(write_failed)
    }
}
