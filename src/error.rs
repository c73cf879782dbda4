//! Error types shared across the crate.
//!
//! Two families exist: [`ConfigError`] for problems with the configuration
//! file and its filter patterns, and [`OrganizeError`] for everything that can
//! go wrong while classifying and placing files. Configuration errors abort a
//! run before any file is touched; most organize errors are per-file and are
//! collected into the run summary instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while organizing files.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Contradictory options were requested (e.g. move and copy together).
    #[error("Conflicting options: {reason}")]
    ConfigConflict { reason: String },
    /// An input path could not be read or is neither a file nor a directory.
    #[error("Invalid input {}: {source}", .path.display())]
    InvalidInput {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a target directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// No free numbered alternative was found for a destination name.
    #[error("No free name for {} after {attempts} attempts", .path.display())]
    CollisionExhausted { path: PathBuf, attempts: u32 },
    /// Copying or moving a file failed.
    #[error("Failed to transfer {} to {}: {source}", .from.display(), .to.display())]
    TransferFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// The file was copied to its destination but the original could not be removed.
    #[error("Copied but could not remove original {}: {source}", .path.display())]
    SourceCleanupFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The JSON run report could not be written.
    #[error("Failed to write report {}: {source}", .path.display())]
    ReportWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Configuration file problem.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl OrganizeError {
    /// Returns true for errors that must stop the run before any file is touched.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigConflict { .. } | Self::Config(_))
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        let conflict = OrganizeError::ConfigConflict {
            reason: "move and copy".to_string(),
        };
        assert!(conflict.is_fatal());

        let config = OrganizeError::from(ConfigError::ConfigInvalid("bad".to_string()));
        assert!(config.is_fatal());
    }

    #[test]
    fn test_per_file_errors_are_not_fatal() {
        let err = OrganizeError::CollisionExhausted {
            path: PathBuf::from("/target/a.txt"),
            attempts: 10,
        };
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "No free name for /target/a.txt after 10 attempts"
        );
    }
}
