//! orgafold - merge scattered files into one classified tree
//!
//! This library classifies files (by suffix, modification date or MIME type)
//! into target subfolders and places them there by copying or moving, without
//! ever overwriting an existing file. A dry run previews every placement, and
//! an analysis mode reports statistics before anything is touched.

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod file_entry;
pub mod merger;
pub mod mime;
pub mod output;
pub mod report;
pub mod rules;
pub mod traversal;

pub use analysis::{AnalysisReport, analyse};
pub use classifier::{TargetSpec, classify};
pub use config::{CompiledFilters, FilterRules, OrgafoldConfig};
pub use error::{ConfigError, OrganizeError, OrganizeResult};
pub use file_entry::FileEntry;
pub use merger::{MergeOutcome, Merger, SkipReason};
pub use mime::MimeType;
pub use rules::{Dimension, RuleConfig, TransferMode};

pub use cli::{Cli, ExecutionMode, RunOptions, RunSummary, run};
