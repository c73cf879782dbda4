//! Classification rules.
//!
//! A [`RuleConfig`] is the immutable set of classification dimensions active
//! for one run. Every dimension is a named boolean with an explicit label, so
//! callers (CLI flags, the TOML config, the analysis reporter) can enumerate
//! and toggle them without any runtime introspection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single classification dimension.
///
/// The declaration order is the priority order in which segments are
/// appended to a classified path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    /// Modification year, `2019`.
    Year,
    /// Modification month, `03`. Always nested under the year.
    Month,
    /// Whole MIME type as one segment.
    #[serde(rename = "mime-type")]
    FullMimeType,
    /// Top-level MIME type, `image`.
    #[serde(rename = "mime")]
    MimeType,
    /// MIME subtype, `gif`.
    #[serde(rename = "subtype")]
    MimeSubtype,
    /// Lowercase file extension.
    Suffix,
}

impl Dimension {
    /// All dimensions, in priority order.
    pub const ALL: [Dimension; 6] = [
        Dimension::Year,
        Dimension::Month,
        Dimension::FullMimeType,
        Dimension::MimeType,
        Dimension::MimeSubtype,
        Dimension::Suffix,
    ];

    /// The label used on the command line, in the config file and in analysis headers.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::Month => "month",
            Dimension::FullMimeType => "mime-type",
            Dimension::MimeType => "mime",
            Dimension::MimeSubtype => "subtype",
            Dimension::Suffix => "suffix",
        }
    }

    /// Returns true if this dimension needs MIME detection.
    pub fn needs_mime(&self) -> bool {
        matches!(
            self,
            Dimension::FullMimeType | Dimension::MimeType | Dimension::MimeSubtype
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The active combination of classification dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleConfig {
    pub by_suffix: bool,
    pub by_year: bool,
    pub by_month: bool,
    pub by_mime_type: bool,
    pub by_mime_subtype: bool,
    pub by_full_mime_type: bool,
}

impl RuleConfig {
    /// Builds a rule set with exactly the given dimensions enabled.
    pub fn from_dimensions(dimensions: &[Dimension]) -> Self {
        let mut rules = Self::default();
        for dimension in dimensions {
            rules.set(*dimension, true);
        }
        rules
    }

    /// Returns whether a dimension is enabled.
    pub fn get(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Year => self.by_year,
            Dimension::Month => self.by_month,
            Dimension::FullMimeType => self.by_full_mime_type,
            Dimension::MimeType => self.by_mime_type,
            Dimension::MimeSubtype => self.by_mime_subtype,
            Dimension::Suffix => self.by_suffix,
        }
    }

    /// Enables or disables a dimension.
    pub fn set(&mut self, dimension: Dimension, enabled: bool) {
        let field = match dimension {
            Dimension::Year => &mut self.by_year,
            Dimension::Month => &mut self.by_month,
            Dimension::FullMimeType => &mut self.by_full_mime_type,
            Dimension::MimeType => &mut self.by_mime_type,
            Dimension::MimeSubtype => &mut self.by_mime_subtype,
            Dimension::Suffix => &mut self.by_suffix,
        };
        *field = enabled;
    }

    /// The enabled dimensions, in priority order.
    pub fn active(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.get(*d))
            .collect()
    }

    /// Returns true if no dimension is enabled.
    pub fn is_empty(&self) -> bool {
        self.active().is_empty()
    }

    /// Returns true if any MIME-based dimension is enabled.
    pub fn needs_mime(&self) -> bool {
        self.by_mime_type || self.by_mime_subtype || self.by_full_mime_type
    }

    /// Returns true if a date segment is produced. Month implies year.
    pub fn uses_year(&self) -> bool {
        self.by_year || self.by_month
    }

    /// Returns true if the suffix segment takes effect.
    ///
    /// Suffix is the lowest-priority classifier and is ignored whenever a MIME
    /// dimension is requested.
    pub fn uses_suffix(&self) -> bool {
        self.by_suffix && !self.needs_mime()
    }
}

impl fmt::Display for RuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.active();
        if active.is_empty() {
            return f.write_str("none");
        }
        let labels: Vec<_> = active.iter().map(Dimension::label).collect();
        f.write_str(&labels.join(", "))
    }
}

/// Whether files are copied or moved into place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

impl TransferMode {
    pub fn verb(&self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Move => "move",
        }
    }
}
