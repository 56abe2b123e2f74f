/// Filesystem mutations used by the sorter and the flattener.
///
/// [`Mover`] is the only place that moves, deletes or creates anything. In
/// dry-run mode every mutation is replaced by a "Would ..." log line.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Tolerance when comparing modification times of two files.
pub const MTIME_TOLERANCE: Duration = Duration::from_secs(1);

/// Errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("Failed to remove file {}: {source}", path.display())]
    FileRemovalFailed { path: PathBuf, source: io::Error },
    #[error("Failed to remove directory {}: {source}", path.display())]
    DirectoryRemovalFailed { path: PathBuf, source: io::Error },
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDirFailed { path: PathBuf, source: io::Error },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Why a move did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Source and destination are the same path.
    SamePath,
    /// Destination holds an identical file and overwriting is off.
    Duplicate,
    /// Destination holds a different file and overwriting is off.
    DestinationExists,
}

/// What [`Mover::move_file`] did (or would do, in dry-run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Overwritten,
    Skipped(SkipReason),
}

impl MoveOutcome {
    /// True if the file left (or would leave) its source path.
    pub fn is_moved(self) -> bool {
        matches!(self, MoveOutcome::Moved | MoveOutcome::Overwritten)
    }
}

/// What [`Mover::remove_dir_if_empty`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirRemoval {
    Removed,
    NotEmpty,
}

/// Performs (or simulates) filesystem mutations and logs each one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mover {
    dry_run: bool,
}

impl Mover {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Moves `source` to `destination`, tagging log lines with `label`.
    ///
    /// An existing destination is overwritten only when `allow_overwrite`
    /// is set; otherwise the move is skipped.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use folderfix::file_organizer::{MoveOutcome, Mover};
    /// use std::path::Path;
    ///
    /// let mover = Mover::new(false);
    /// let outcome = mover.move_file(
    ///     Path::new("/work/hero_U101_v1.fbx"),
    ///     Path::new("/work/Hero_U101/hero_U101_v1.fbx"),
    ///     "BASE+VER",
    ///     false,
    /// );
    /// assert!(matches!(outcome, Ok(MoveOutcome::Moved)));
    /// ```
    pub fn move_file(
        &self,
        source: &Path,
        destination: &Path,
        label: &str,
        allow_overwrite: bool,
    ) -> OrganizeResult<MoveOutcome> {
        if same_path(source, destination) {
            log::info!(
                "[{}] Source equals destination, skipping: {}",
                label,
                source.display()
            );
            return Ok(MoveOutcome::Skipped(SkipReason::SamePath));
        }

        let mut outcome = MoveOutcome::Moved;
        if destination.exists() {
            if !allow_overwrite {
                let reason = if files_are_identical(source, destination) {
                    log::warn!("[{}] Skipped duplicate: {}", label, source.display());
                    SkipReason::Duplicate
                } else {
                    log::warn!(
                        "[{}] File already exists, skipping: {}",
                        label,
                        source.display()
                    );
                    SkipReason::DestinationExists
                };
                return Ok(MoveOutcome::Skipped(reason));
            }
            outcome = MoveOutcome::Overwritten;
        }

        let verb = match (outcome, self.dry_run) {
            (MoveOutcome::Overwritten, true) => "Would overwrite",
            (MoveOutcome::Overwritten, false) => "Overwriting",
            (_, true) => "Would move",
            (_, false) => "Moved",
        };

        if !self.dry_run {
            rename_or_copy(source, destination).map_err(|e| {
                log::error!(
                    "[{}] Move failed: {} -> {} | Error: {}",
                    label,
                    source.display(),
                    destination.display(),
                    e
                );
                OrganizeError::FileMoveFailure {
                    from: source.to_path_buf(),
                    to: destination.to_path_buf(),
                    source: e,
                }
            })?;
        }

        log::info!(
            "[{}] {}: {} -> {}",
            label,
            verb,
            source.display(),
            destination.display()
        );
        Ok(outcome)
    }

    /// Deletes a single file.
    pub fn remove_file(&self, path: &Path) -> OrganizeResult<()> {
        if self.dry_run {
            log::info!("Would remove: {}", path.display());
            return Ok(());
        }
        fs::remove_file(path).map_err(|e| OrganizeError::FileRemovalFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Removed: {}", path.display());
        Ok(())
    }

    /// Removes `path` only if it is an empty directory at call time.
    ///
    /// Dry-run callers decide emptiness themselves, since nothing has
    /// actually been moved out of the directory.
    pub fn remove_dir_if_empty(&self, path: &Path) -> OrganizeResult<DirRemoval> {
        if self.dry_run {
            log::info!("Would delete subfolder: {}", path.display());
            return Ok(DirRemoval::Removed);
        }

        let mut entries = fs::read_dir(path).map_err(|e| OrganizeError::ReadDirFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        if entries.next().is_some() {
            log::warn!("Folder not empty, skipping deletion: {}", path.display());
            return Ok(DirRemoval::NotEmpty);
        }

        fs::remove_dir(path).map_err(|e| OrganizeError::DirectoryRemovalFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Deleted subfolder: {}", path.display());
        Ok(DirRemoval::Removed)
    }

    /// Creates `path` if missing. Returns true if it was (or would be) created.
    pub fn create_dir(&self, path: &Path) -> OrganizeResult<bool> {
        if path.exists() {
            log::info!("Already exists: {}", path.display());
            return Ok(false);
        }
        if self.dry_run {
            log::info!("Would create: {}", path.display());
            return Ok(true);
        }
        fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Created: {}", path.display());
        Ok(true)
    }
}

/// True if both files have the same size and modification times within
/// [`MTIME_TOLERANCE`]. Any stat failure counts as "not identical".
pub fn files_are_identical(first: &Path, second: &Path) -> bool {
    let (Ok(a), Ok(b)) = (fs::metadata(first), fs::metadata(second)) else {
        return false;
    };
    if a.len() != b.len() {
        return false;
    }
    let (Ok(a_time), Ok(b_time)) = (a.modified(), b.modified()) else {
        return false;
    };
    let diff = a_time
        .duration_since(b_time)
        .or_else(|_| b_time.duration_since(a_time))
        .unwrap_or(Duration::MAX);
    diff < MTIME_TOLERANCE
}

fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Renames, falling back to copy + delete when the rename cannot cross
/// filesystems.
fn rename_or_copy(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !source.is_file() || destination.is_dir() {
                return Err(rename_err);
            }
            match fs::copy(source, destination) {
                Ok(_) => fs::remove_file(source),
                Err(_) => Err(rename_err),
            }
        }
    }
}
