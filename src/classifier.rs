//! Maps files to the subfolder they belong in.
//!
//! Segments are appended in a fixed priority order:
//!
//! 1. year, then month nested beneath it (month always implies year)
//! 2. the whole MIME type as one segment, or else
//! 3. the MIME type and/or subtype as nested segments, or else
//! 4. the lowercase suffix, falling back to the MIME type when the file has none
//!
//! With no rule active the subfolder is empty and the file lands directly in
//! the target root (beneath any nesting preserved from the source tree).

use crate::file_entry::FileEntry;
use crate::rules::RuleConfig;
use std::path::{Path, PathBuf};

/// Computes the ordered subfolder segments for a file.
///
/// MIME detection only happens when a rule needs it, including the suffix
/// fallback for files without an extension.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use orgafold::classifier::classify;
/// use orgafold::file_entry::FileEntry;
/// use orgafold::rules::{Dimension, RuleConfig};
///
/// let modified = Local.with_ymd_and_hms(2019, 3, 10, 12, 0, 0).unwrap();
/// let mut entry = FileEntry::new("/src/a.TXT", 7, modified);
/// let rules = RuleConfig::from_dimensions(&[Dimension::Month, Dimension::Suffix]);
///
/// assert_eq!(classify(&mut entry, &rules), vec!["2019", "03", "txt"]);
/// ```
pub fn classify(entry: &mut FileEntry, rules: &RuleConfig) -> Vec<String> {
    let mut segments = Vec::new();

    if rules.uses_year() {
        segments.push(format!("{:04}", entry.year()));
        if rules.by_month {
            segments.push(format!("{:02}", entry.month()));
        }
    }

    if rules.by_full_mime_type {
        segments.push(entry.mime().dir_name());
    } else if rules.by_mime_type || rules.by_mime_subtype {
        let mime = entry.mime();
        if rules.by_mime_type {
            segments.push(mime.top_level().to_string());
        }
        if rules.by_mime_subtype {
            segments.push(mime.subtype().to_string());
        }
    } else if rules.by_suffix {
        if entry.extension().is_empty() {
            segments.push(entry.mime().top_level().to_string());
        } else {
            segments.push(entry.extension().to_string());
        }
    }

    segments
}

/// Where a classified file goes: root, classification bucket, then any
/// nesting preserved from the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub root: PathBuf,
    pub subfolder: Vec<String>,
    pub nested: PathBuf,
}

impl TargetSpec {
    /// Classifies `entry` under `root`, keeping `nested` beneath the bucket.
    pub fn resolve(root: &Path, entry: &mut FileEntry, rules: &RuleConfig, nested: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            subfolder: classify(entry, rules),
            nested: nested.to_path_buf(),
        }
    }

    /// The directory the file is placed into.
    pub fn target_dir(&self) -> PathBuf {
        let mut dir = self.root.clone();
        dir.extend(&self.subfolder);
        if !self.nested.as_os_str().is_empty() {
            dir.push(&self.nested);
        }
        dir
    }
}
