/// A regular file read from a source tree.
///
/// Entries are transient: they are rebuilt on every traversal and never
/// persisted. The MIME type is only detected when a classification step asks
/// for it, and is then cached for the remaining lifetime of the entry.
use crate::mime::MimeType;
use chrono::{DateTime, Datelike, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileEntry {
    path: PathBuf,
    size: u64,
    modified: DateTime<Local>,
    extension: String,
    mime: Option<MimeType>,
}

impl FileEntry {
    /// Builds an entry from explicit attributes.
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: DateTime<Local>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self {
            path,
            size,
            modified,
            extension,
            mime: None,
        }
    }

    /// Reads an entry from disk without following symlinks.
    ///
    /// Fails with `InvalidInput` if the path is not a regular file.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        if !metadata.file_type().is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        let modified = DateTime::<Local>::from(metadata.modified()?);
        Ok(Self::new(path, metadata.len(), modified))
    }

    /// Attaches a known MIME type, skipping detection.
    pub fn with_mime(mut self, mime: MimeType) -> Self {
        self.mime = Some(mime);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn year(&self) -> i32 {
        self.modified.year()
    }

    pub fn month(&self) -> u32 {
        self.modified.month()
    }

    /// Lowercase extension without the dot, empty if there is none.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The MIME type, detected on first use.
    pub fn mime(&mut self) -> &MimeType {
        let path = &self.path;
        self.mime.get_or_insert_with(|| MimeType::detect(path))
    }

    /// The MIME type if it has already been resolved.
    pub fn cached_mime(&self) -> Option<&MimeType> {
        self.mime.as_ref()
    }
}
