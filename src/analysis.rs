//! Pre-run statistics over a set of files.
//!
//! Analysis never touches the filesystem beyond what MIME detection reads, so
//! it is always safe to run and needs no confirmation.

use crate::file_entry::FileEntry;
use crate::rules::Dimension;
use std::collections::HashMap;
use std::fmt;

/// Label used for files without an extension.
pub const NO_SUFFIX: &str = "(none)";

/// Count and total size of the files sharing one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisGroup {
    pub label: String,
    pub count: usize,
    pub total_bytes: u64,
}

/// Files grouped by one classification dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub dimension: Dimension,
    pub groups: Vec<AnalysisGroup>,
}

impl AnalysisReport {
    /// Groups `entries` by `dimension`.
    ///
    /// Groups are sorted by descending count, ties broken alphabetically.
    pub fn build<'a>(
        entries: impl IntoIterator<Item = &'a mut FileEntry>,
        dimension: Dimension,
    ) -> Self {
        let mut totals = HashMap::new();
        for entry in entries {
            accumulate(&mut totals, entry, dimension);
        }
        Self::from_totals(dimension, totals)
    }

    fn from_totals(dimension: Dimension, totals: HashMap<String, (usize, u64)>) -> Self {
        let mut groups: Vec<_> = totals
            .into_iter()
            .map(|(label, (count, total_bytes))| AnalysisGroup {
                label,
                count,
                total_bytes,
            })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        Self { dimension, groups }
    }

    /// The text block printed to the user.
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Analysis: {}", self.dimension)?;
        for group in &self.groups {
            write!(
                f,
                "\n{}× {} {} Bytes",
                group.count, group.label, group.total_bytes
            )?;
        }
        Ok(())
    }
}

/// Builds one report per dimension in a single pass; suffix when none is given.
pub fn analyse<'a>(
    entries: impl IntoIterator<Item = &'a mut FileEntry>,
    dimensions: &[Dimension],
) -> Vec<AnalysisReport> {
    let dimensions = if dimensions.is_empty() {
        vec![Dimension::Suffix]
    } else {
        dimensions.to_vec()
    };

    let mut totals = vec![HashMap::new(); dimensions.len()];
    for entry in entries {
        for (dimension, total) in dimensions.iter().zip(totals.iter_mut()) {
            accumulate(total, entry, *dimension);
        }
    }

    dimensions
        .into_iter()
        .zip(totals)
        .map(|(dimension, total)| AnalysisReport::from_totals(dimension, total))
        .collect()
}

fn accumulate(totals: &mut HashMap<String, (usize, u64)>, entry: &mut FileEntry, dimension: Dimension) {
    let total = totals.entry(label_for(entry, dimension)).or_default();
    total.0 += 1;
    total.1 += entry.size();
}

fn label_for(entry: &mut FileEntry, dimension: Dimension) -> String {
    match dimension {
        Dimension::Suffix if entry.extension().is_empty() => NO_SUFFIX.to_string(),
        Dimension::Suffix => format!(".{}", entry.extension()),
        Dimension::Year => format!("{:04}", entry.year()),
        Dimension::Month => format!("{:04}-{:02}", entry.year(), entry.month()),
        Dimension::FullMimeType => entry.mime().to_string(),
        Dimension::MimeType => entry.mime().top_level().to_string(),
        Dimension::MimeSubtype => entry.mime().subtype().to_string(),
    }
}
