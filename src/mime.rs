//! MIME type detection.
//!
//! Detection sniffs the file content first with `infer` (recovered files often
//! carry wrong or missing extensions), then guesses from the extension with
//! `mime_guess`, and finally settles on `unknown/unknown`. Detection never
//! fails: unreadable files simply fall through to the next strategy.
//!
//! # Examples
//!
//! ```
//! use orgafold::mime::MimeType;
//!
//! let mime = MimeType::parse("image/gif");
//! assert_eq!(mime.top_level(), "image");
//! assert_eq!(mime.subtype(), "gif");
//! assert_eq!(mime.dir_name(), "image_gif");
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Top-level type and subtype reported when nothing can be detected.
pub const UNKNOWN: &str = "unknown";

/// A two-part MIME classification such as `image`/`gif`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MimeType {
    top_level: String,
    subtype: String,
}

impl MimeType {
    pub fn new(top_level: &str, subtype: &str) -> Self {
        Self {
            top_level: sanitize(top_level),
            subtype: sanitize(subtype),
        }
    }

    /// Parses `type/subtype`, dropping any parameters (`; charset=...`).
    ///
    /// Malformed input yields the unknown type rather than an error.
    pub fn parse(essence: &str) -> Self {
        let essence = essence.split(';').next().unwrap_or_default().trim();
        match essence.split_once('/') {
            Some((top, sub)) if !top.is_empty() && !sub.is_empty() => Self::new(top, sub),
            _ => Self::unknown(),
        }
    }

    /// The sentinel returned for undetectable content.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }

    pub fn is_unknown(&self) -> bool {
        self.top_level == UNKNOWN
    }

    pub fn top_level(&self) -> &str {
        &self.top_level
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The whole type as a single directory name: `image/gif` becomes `image_gif`.
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.top_level, self.subtype)
    }

    /// Detects the MIME type of a file.
    pub fn detect(path: &Path) -> Self {
        match infer::get_from_path(path) {
            Ok(Some(kind)) => return Self::parse(kind.mime_type()),
            Ok(None) => {}
            Err(e) => debug!("Cannot sniff content of {}: {}", path.display(), e),
        }

        mime_guess::from_path(path)
            .first()
            .map(|guess| Self::new(guess.type_().as_str(), guess.subtype().as_str()))
            .unwrap_or_else(Self::unknown)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.top_level, self.subtype)
    }
}

/// Lowercases a MIME part and keeps it usable as a single path segment.
fn sanitize(part: &str) -> String {
    let part = part.trim().to_lowercase();
    if part.is_empty() || part == "." || part == ".." {
        return UNKNOWN.to_string();
    }
    part.replace(['/', '\\'], "_")
}
