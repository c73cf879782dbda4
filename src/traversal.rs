/// Enumerates the files of one input root.
///
/// The whole candidate list is collected before anything is placed, so files
/// written into an output directory inside the root are never visited again.
/// Entries are sorted by name at every level, which keeps dry runs
/// reproducible.
use crate::config::CompiledFilters;
use crate::file_entry::FileEntry;
use log::warn;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// One item found below an input root.
#[derive(Debug, Clone)]
pub enum Candidate {
    /// A regular file and the directory nesting to keep beneath its bucket.
    File { entry: FileEntry, nested: PathBuf },
    /// A symlink, socket, fifo or device file.
    Unsupported { path: PathBuf },
    /// A path that could not be read.
    Unreadable { path: PathBuf, error: String },
}

impl Candidate {
    /// The file entry, for regular files.
    pub fn entry_mut(&mut self) -> Option<&mut FileEntry> {
        match self {
            Candidate::File { entry, .. } => Some(entry),
            _ => None,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Candidate::File { entry, .. } => entry.path(),
            Candidate::Unsupported { path } | Candidate::Unreadable { path, .. } => path,
        }
    }
}

/// Walks `root`, one level deep unless `recursive` is set.
///
/// Symlinks are reported as [`Candidate::Unsupported`] and never followed.
/// Files rejected by `filters` are left out entirely.
pub fn collect(root: &Path, recursive: bool, filters: &CompiledFilters) -> Vec<Candidate> {
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .follow_links(false)
        .sort_by_file_name();

    let mut candidates = Vec::new();
    for item in walker {
        let dir_entry = match item {
            Ok(dir_entry) => dir_entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!("Cannot read {}: {}", path.display(), e);
                candidates.push(Candidate::Unreadable {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let file_type = dir_entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let path = dir_entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if !filters.should_include(relative) {
            continue;
        }

        if !file_type.is_file() {
            warn!("Skipping {}: not a regular file", path.display());
            candidates.push(Candidate::Unsupported {
                path: path.to_path_buf(),
            });
            continue;
        }

        match FileEntry::from_path(path) {
            Ok(entry) => candidates.push(Candidate::File {
                entry,
                nested: preserved_nesting(relative),
            }),
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                candidates.push(Candidate::Unreadable {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }
    candidates
}

/// The directories between the top-level child of the root and the file.
///
/// `blah2/foo/file3` keeps `foo`; `blah1/file1` and `file0` keep nothing.
pub fn preserved_nesting(relative: &Path) -> PathBuf {
    let dirs: Vec<Component> = match relative.parent() {
        Some(parent) => parent.components().collect(),
        None => Vec::new(),
    };
    dirs.into_iter().skip(1).collect()
}
