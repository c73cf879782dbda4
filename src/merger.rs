/// Collision-safe placement of files into their target directories.
///
/// The merger never overwrites. A destination that is occupied on disk, or
/// that was already handed out earlier in the same run, is replaced by the
/// first free numbered alternative (`name (2).ext`, `name (3).ext`, ...).
/// Names are reserved in memory as soon as they are chosen, so two files of
/// one batch can never be given the same destination, even in a dry run where
/// nothing is written.
use crate::error::{OrganizeError, OrganizeResult};
use crate::rules::TransferMode;
use filetime::FileTime;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Upper bound on numbered alternatives probed for a single file.
pub const MAX_PROBES: u32 = 100_000;

/// Why a file was left where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Symlinks and other non-regular files are never transferred.
    UnsupportedType,
    /// The resolved destination is the source file itself.
    AlreadyInPlace,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedType => f.write_str("unsupported-type"),
            SkipReason::AlreadyInPlace => f.write_str("already-in-place"),
        }
    }
}

/// The result of placing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum MergeOutcome {
    Copied {
        source: PathBuf,
        destination: PathBuf,
    },
    Moved {
        source: PathBuf,
        destination: PathBuf,
    },
    WouldCopy {
        source: PathBuf,
        destination: PathBuf,
    },
    WouldMove {
        source: PathBuf,
        destination: PathBuf,
    },
    Skipped {
        source: PathBuf,
        reason: SkipReason,
    },
}

impl MergeOutcome {
    /// The resolved destination, absent for skipped files.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::Copied { destination, .. }
            | Self::Moved { destination, .. }
            | Self::WouldCopy { destination, .. }
            | Self::WouldMove { destination, .. } => Some(destination),
            Self::Skipped { .. } => None,
        }
    }

    /// Returns true for dry-run previews.
    pub fn is_preview(&self) -> bool {
        matches!(self, Self::WouldCopy { .. } | Self::WouldMove { .. })
    }

    /// Returns true if a file was actually written.
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Copied { .. } | Self::Moved { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

impl fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied {
                source,
                destination,
            } => write!(f, "Copied {} -> {}", source.display(), destination.display()),
            Self::Moved {
                source,
                destination,
            } => write!(f, "Moved {} -> {}", source.display(), destination.display()),
            Self::WouldCopy {
                source,
                destination,
            } => write!(
                f,
                "Would copy {} -> {}",
                source.display(),
                destination.display()
            ),
            Self::WouldMove {
                source,
                destination,
            } => write!(
                f,
                "Would move {} -> {}",
                source.display(),
                destination.display()
            ),
            Self::Skipped { source, reason } => {
                write!(f, "Skipped {} ({})", source.display(), reason)
            }
        }
    }
}

/// Places files into target directories, copying or moving them.
///
/// One merger should be used for a whole invocation: it owns the in-run name
/// reservations and the cache of directories already created.
///
/// # Examples
///
/// ```no_run
/// use orgafold::merger::Merger;
/// use orgafold::rules::TransferMode;
/// use std::path::Path;
///
/// let mut merger = Merger::new(TransferMode::Copy, false);
/// let outcome = merger
///     .place(Path::new("/src/a.txt"), Path::new("/target/txt"))
///     .expect("placement failed");
/// println!("{}", outcome);
/// ```
#[derive(Debug)]
pub struct Merger {
    transfer: TransferMode,
    execute: bool,
    max_probes: u32,
    reserved: HashSet<PathBuf>,
    /// Sources a dry-run move has already taken away.
    vacated: HashSet<PathBuf>,
    created_dirs: HashSet<PathBuf>,
}

impl Merger {
    /// Creates a merger. With `execute` false nothing on disk is modified.
    pub fn new(transfer: TransferMode, execute: bool) -> Self {
        Self {
            transfer,
            execute,
            max_probes: MAX_PROBES,
            reserved: HashSet::new(),
            vacated: HashSet::new(),
            created_dirs: HashSet::new(),
        }
    }

    /// Overrides the collision probe limit.
    pub fn with_max_probes(mut self, max_probes: u32) -> Self {
        self.max_probes = max_probes.max(1);
        self
    }

    /// Places `source` into `target_dir` under its own name or the first free
    /// numbered alternative.
    ///
    /// # Errors
    ///
    /// Every error concerns this file only; the caller is expected to record
    /// it and continue with the next file.
    pub fn place(&mut self, source: &Path, target_dir: &Path) -> OrganizeResult<MergeOutcome> {
        let metadata =
            fs::symlink_metadata(source).map_err(|e| OrganizeError::InvalidInput {
                path: source.to_path_buf(),
                source: e,
            })?;
        if !metadata.file_type().is_file() {
            warn!("Skipping {}: not a regular file", source.display());
            return Ok(MergeOutcome::Skipped {
                source: source.to_path_buf(),
                reason: SkipReason::UnsupportedType,
            });
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| OrganizeError::InvalidInput {
                path: source.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
            })?;

        let candidate = target_dir.join(file_name);
        if is_same_file(source, &candidate) {
            debug!("{} is already in place", source.display());
            return Ok(MergeOutcome::Skipped {
                source: source.to_path_buf(),
                reason: SkipReason::AlreadyInPlace,
            });
        }

        let destination = self.reserve(&candidate)?;
        let source = source.to_path_buf();

        if !self.execute {
            return Ok(match self.transfer {
                TransferMode::Copy => MergeOutcome::WouldCopy {
                    source,
                    destination,
                },
                TransferMode::Move => {
                    self.vacated.insert(source.clone());
                    MergeOutcome::WouldMove {
                        source,
                        destination,
                    }
                }
            });
        }

        self.ensure_dir(target_dir)?;
        match self.transfer {
            TransferMode::Copy => {
                copy_no_clobber(&source, &destination).map_err(|e| {
                    OrganizeError::TransferFailed {
                        from: source.clone(),
                        to: destination.clone(),
                        source: e,
                    }
                })?;
                info!("Copied {} -> {}", source.display(), destination.display());
                Ok(MergeOutcome::Copied {
                    source,
                    destination,
                })
            }
            TransferMode::Move => {
                move_no_clobber(&source, &destination)?;
                info!("Moved {} -> {}", source.display(), destination.display());
                Ok(MergeOutcome::Moved {
                    source,
                    destination,
                })
            }
        }
    }

    /// Creates `dir` and its parents, at most once per run.
    pub fn ensure_dir(&mut self, dir: &Path) -> OrganizeResult<()> {
        if self.created_dirs.contains(dir) {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        debug!("Ensured directory {}", dir.display());
        self.created_dirs.insert(dir.to_path_buf());
        Ok(())
    }

    /// Returns true if a destination is occupied on disk or reserved in this run.
    ///
    /// In a dry-run move, a source previewed earlier in the batch counts as
    /// free, as it would be once the real run has moved it away.
    pub fn is_taken(&self, path: &Path) -> bool {
        if self.reserved.contains(path) {
            return true;
        }
        !self.vacated.contains(path) && fs::symlink_metadata(path).is_ok()
    }

    /// Picks and reserves the first free name for `candidate`.
    fn reserve(&mut self, candidate: &Path) -> OrganizeResult<PathBuf> {
        let mut destination = candidate.to_path_buf();
        let mut counter = 1;
        while self.is_taken(&destination) {
            counter += 1;
            if counter > self.max_probes {
                return Err(OrganizeError::CollisionExhausted {
                    path: candidate.to_path_buf(),
                    attempts: self.max_probes,
                });
            }
            destination = numbered_name(candidate, counter);
        }
        self.reserved.insert(destination.clone());
        Ok(destination)
    }
}

/// `dir/name.ext` becomes `dir/name (n).ext`.
///
/// Only the last extension is kept after the counter, so `a.tar.gz` becomes
/// `a.tar (2).gz`, and dotfiles like `.bashrc` become `.bashrc (2)`.
pub fn numbered_name(candidate: &Path, n: u32) -> PathBuf {
    let mut name = candidate.file_stem().unwrap_or_default().to_os_string();
    name.push(format!(" ({n})"));
    if let Some(ext) = candidate.extension() {
        name.push(".");
        name.push(ext);
    }
    candidate.with_file_name(name)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copies through a temporary file in the destination directory, then links
/// it into place only if the destination is still free.
fn copy_no_clobber(source: &Path, destination: &Path) -> io::Result<()> {
    let parent = destination.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent")
    })?;
    let metadata = fs::metadata(source)?;
    let mut input = File::open(source)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".orgafold-")
        .suffix(".part")
        .tempfile_in(parent)?;
    io::copy(&mut input, temp.as_file_mut())?;

    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_handle_times(temp.as_file(), None, Some(mtime))?;
    temp.as_file().set_permissions(metadata.permissions())?;

    temp.persist_noclobber(destination).map_err(|e| e.error)?;
    Ok(())
}

/// Hard link + unlink never replaces an existing destination. Across
/// filesystems, fall back to copy + delete.
fn move_no_clobber(source: &Path, destination: &Path) -> OrganizeResult<()> {
    let transfer_failed = |e: io::Error| OrganizeError::TransferFailed {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    };

    match fs::hard_link(source, destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(transfer_failed(e)),
        Err(e) => {
            warn!(
                "Cannot link {} -> {} ({}), falling back to copy and delete",
                source.display(),
                destination.display(),
                e
            );
            copy_no_clobber(source, destination).map_err(transfer_failed)?;
        }
    }

    fs::remove_file(source).map_err(|e| OrganizeError::SourceCleanupFailed {
        path: source.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(
            numbered_name(Path::new("/t/a.txt"), 2),
            PathBuf::from("/t/a (2).txt")
        );
        assert_eq!(
            numbered_name(Path::new("/t/a.tar.gz"), 3),
            PathBuf::from("/t/a.tar (3).gz")
        );
        assert_eq!(
            numbered_name(Path::new("/t/README"), 2),
            PathBuf::from("/t/README (2)")
        );
        assert_eq!(
            numbered_name(Path::new("/t/.bashrc"), 2),
            PathBuf::from("/t/.bashrc (2)")
        );
    }

    #[test]
    fn test_copy_creates_target_and_keeps_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/a.txt");
        write(&source, "testing");
        let target = temp_dir.path().join("target/txt");

        let mut merger = Merger::new(TransferMode::Copy, true);
        let outcome = merger.place(&source, &target).unwrap();

        assert_eq!(
            outcome,
            MergeOutcome::Copied {
                source: source.clone(),
                destination: target.join("a.txt"),
            }
        );
        assert!(source.exists());
        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "testing");
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/a.txt");
        write(&source, "testing");
        let mtime = FileTime::from_unix_time(1_552_219_200, 0);
        filetime::set_file_mtime(&source, mtime).unwrap();

        let target = temp_dir.path().join("target");
        let mut merger = Merger::new(TransferMode::Copy, true);
        merger.place(&source, &target).unwrap();

        let copied = fs::metadata(target.join("a.txt")).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&copied), mtime);
    }

    #[test]
    fn test_move_removes_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/a.txt");
        write(&source, "testing");
        let target = temp_dir.path().join("target");

        let mut merger = Merger::new(TransferMode::Move, true);
        let outcome = merger.place(&source, &target).unwrap();

        assert!(matches!(outcome, MergeOutcome::Moved { .. }));
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "testing");
    }

    #[test]
    fn test_never_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/a.txt");
        write(&source, "new");
        let target = temp_dir.path().join("target");
        write(&target.join("a.txt"), "old");

        let mut merger = Merger::new(TransferMode::Copy, true);
        let outcome = merger.place(&source, &target).unwrap();

        assert_eq!(outcome.destination(), Some(target.join("a (2).txt").as_path()));
        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(target.join("a (2).txt")).unwrap(), "new");
    }

    #[test]
    fn test_collision_chain() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        write(&target.join("a.txt"), "0");
        write(&target.join("a (2).txt"), "0");
        write(&target.join("a (3).txt"), "0");
        let source = temp_dir.path().join("src/a.txt");
        write(&source, "4");

        let mut merger = Merger::new(TransferMode::Copy, true);
        let outcome = merger.place(&source, &target).unwrap();
        assert_eq!(outcome.destination(), Some(target.join("a (4).txt").as_path()));
    }

    #[test]
    fn test_dry_run_reserves_names_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("src/blah1/a.txt");
        let second = temp_dir.path().join("src/blah2/a.txt");
        write(&first, "1");
        write(&second, "2");
        let target = temp_dir.path().join("target");

        let mut merger = Merger::new(TransferMode::Copy, false);
        let a = merger.place(&first, &target).unwrap();
        let b = merger.place(&second, &target).unwrap();

        assert_eq!(a.to_string(), format!(
            "Would copy {} -> {}",
            first.display(),
            target.join("a.txt").display()
        ));
        assert_eq!(b.destination(), Some(target.join("a (2).txt").as_path()));
        assert!(b.is_preview());
        assert!(!target.exists());
    }

    #[test]
    fn test_real_run_reserves_names_within_batch() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("src/blah1/a.txt");
        let second = temp_dir.path().join("src/blah2/a.txt");
        write(&first, "1");
        write(&second, "2");
        let target = temp_dir.path().join("target");

        let mut merger = Merger::new(TransferMode::Move, true);
        merger.place(&first, &target).unwrap();
        merger.place(&second, &target).unwrap();

        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "1");
        assert_eq!(fs::read_to_string(target.join("a (2).txt")).unwrap(), "2");
    }

    #[test]
    fn test_dry_run_move_matches_real_run() {
        let layout = |root: &Path| {
            write(&root.join("a/x.txt"), "1");
            write(&root.join("b/a/x.txt"), "2");
        };
        let place_both = |root: &Path, execute: bool| {
            let mut merger = Merger::new(TransferMode::Move, execute);
            let first = merger.place(&root.join("a/x.txt"), root).unwrap();
            let second = merger.place(&root.join("b/a/x.txt"), &root.join("a")).unwrap();
            vec![
                first.destination().unwrap().to_path_buf(),
                second.destination().unwrap().to_path_buf(),
            ]
        };

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        layout(root);

        let previewed = place_both(root, false);
        assert!(root.join("a/x.txt").exists());
        let placed = place_both(root, true);

        assert_eq!(previewed, placed);
        assert_eq!(placed, vec![root.join("x.txt"), root.join("a/x.txt")]);
        assert_eq!(fs::read_to_string(root.join("a/x.txt")).unwrap(), "2");
    }

    #[test]
    fn test_dry_run_copy_keeps_sources_occupied() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(&root.join("a/x.txt"), "1");
        write(&root.join("b/a/x.txt"), "2");

        let mut merger = Merger::new(TransferMode::Copy, false);
        merger.place(&root.join("a/x.txt"), root).unwrap();
        let second = merger.place(&root.join("b/a/x.txt"), &root.join("a")).unwrap();

        assert_eq!(second.destination(), Some(root.join("a/x (2).txt").as_path()));
    }

    #[test]
    fn test_copy_never_replaces_a_destination_that_appeared() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/a.txt");
        write(&source, "new");
        let target = temp_dir.path().join("target");
        let destination = target.join("a.txt");
        write(&destination, "old");

        let err = copy_no_clobber(&source, &destination).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
        let leftovers: Vec<_> = fs::read_dir(&target)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(".orgafold-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_move_never_replaces_a_destination_that_appeared() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/a.txt");
        write(&source, "new");
        let destination = temp_dir.path().join("target/a.txt");
        write(&destination, "old");

        let err = move_no_clobber(&source, &destination).unwrap_err();

        assert!(matches!(err, OrganizeError::TransferFailed { .. }));
        assert!(!err.is_fatal());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
    }

    #[test]
    fn test_already_in_place_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        write(&source, "testing");

        let mut merger = Merger::new(TransferMode::Move, true);
        let outcome = merger.place(&source, temp_dir.path()).unwrap();

        assert_eq!(
            outcome,
            MergeOutcome::Skipped {
                source: source.clone(),
                reason: SkipReason::AlreadyInPlace,
            }
        );
        assert!(source.exists());
        assert!(!temp_dir.path().join("a (2).txt").exists());
    }

    #[test]
    fn test_collision_exhaustion_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        write(&target.join("a.txt"), "0");
        write(&target.join("a (2).txt"), "0");
        let source = temp_dir.path().join("src/a.txt");
        write(&source, "new");

        let mut merger = Merger::new(TransferMode::Copy, true).with_max_probes(2);
        let err = merger.place(&source, &target).unwrap_err();
        assert!(matches!(err, OrganizeError::CollisionExhausted { attempts: 2, .. }));
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut merger = Merger::new(TransferMode::Copy, false);
        let err = merger
            .place(&temp_dir.path().join("gone.txt"), temp_dir.path())
            .unwrap_err();
        assert!(matches!(err, OrganizeError::InvalidInput { .. }));
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a/b/c");

        let mut merger = Merger::new(TransferMode::Copy, true);
        merger.ensure_dir(&dir).unwrap();
        merger.ensure_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real.txt");
        write(&real, "testing");
        let link = temp_dir.path().join("link.txt");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let target = temp_dir.path().join("target");

        let mut merger = Merger::new(TransferMode::Move, true);
        let outcome = merger.place(&link, &target).unwrap();

        assert_eq!(
            outcome,
            MergeOutcome::Skipped {
                source: link.clone(),
                reason: SkipReason::UnsupportedType,
            }
        );
        assert!(link.exists());
        assert!(!target.exists());
    }
}
