//! Name collision resolution.
//!
//! When a destination already exists, the resolver picks the path the file
//! should actually go to:
//!
//! - overwrite allowed: the destination itself
//! - reset mode: every `<stem>_<n><ext>` sibling (n in `1..=limit`) is
//!   deleted and the unsuffixed destination is reused
//! - otherwise: the first free `<stem>_<n><ext>`, or
//!   [`CollisionError::TooManyCollisions`] past the limit

use crate::file_organizer::Mover;
use crate::mode::ExecutionMode;
use crate::naming::suffixed_os_name;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollisionError {
    #[error("Too many filename collisions for {} (limit {limit})", path.display())]
    TooManyCollisions { path: PathBuf, limit: u32 },
}

/// Chooses effective destinations for colliding names.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver<'a> {
    limit: u32,
    mover: &'a Mover,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(limit: u32, mover: &'a Mover) -> Self {
        Self { limit, mover }
    }

    /// Resolves `destination` under the given overwrite flag and mode.
    ///
    /// A destination that does not exist is returned unchanged. In reset
    /// mode with overwrite off, suffixed siblings are deleted through the
    /// [`Mover`] (logged only in dry-run); a failed deletion is logged and
    /// the remaining ones are still attempted.
    pub fn resolve(
        &self,
        destination: &Path,
        allow_overwrite: bool,
        mode: ExecutionMode,
    ) -> Result<PathBuf, CollisionError> {
        if !destination.exists() || allow_overwrite {
            return Ok(destination.to_path_buf());
        }

        let raw_name = destination.file_name().unwrap_or_default();
        let file_name = raw_name.to_string_lossy();

        if mode.purges_suffixed() {
            self.purge_suffixed(destination, raw_name);
            log::debug!("Cleaned suffixed files, using original name: {}", file_name);
            return Ok(destination.to_path_buf());
        }

        for n in 1..=self.limit {
            let candidate = destination.with_file_name(suffixed_os_name(raw_name, n));
            if !candidate.exists() {
                log::debug!(
                    "Collision resolved: {} -> {}",
                    file_name,
                    candidate.display()
                );
                return Ok(candidate);
            }
        }

        log::error!("Too many filename collisions for: {}", file_name);
        Err(CollisionError::TooManyCollisions {
            path: destination.to_path_buf(),
            limit: self.limit,
        })
    }

    fn purge_suffixed(&self, destination: &Path, file_name: &OsStr) {
        let stale = (1..=self.limit)
            .map(|n| destination.with_file_name(suffixed_os_name(file_name, n)))
            .filter(|candidate| candidate.exists());

        for candidate in stale {
            if let Err(e) = self.mover.remove_file(&candidate) {
                log::error!("Failed to remove suffixed duplicate: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, "x").expect("Failed to write test file");
    }

    #[test]
    fn test_missing_destination_returned_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dest = temp_dir.path().join("free.fbx");
        let mover = Mover::new(false);
        let resolver = CollisionResolver::new(999, &mover);

        for mode in ExecutionMode::ALL {
            assert_eq!(resolver.resolve(&dest, false, mode).unwrap(), dest);
        }
    }

    #[test]
    fn test_overwrite_returns_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dest = temp_dir.path().join("taken.fbx");
        touch(&dest);
        touch(&temp_dir.path().join("taken_1.fbx"));

        let mover = Mover::new(false);
        let resolver = CollisionResolver::new(999, &mover);
        let resolved = resolver
            .resolve(&dest, true, ExecutionMode::ResetOverwrite)
            .unwrap();
        assert_eq!(resolved, dest);
        // Overwrite short-circuits before any purge
        assert!(temp_dir.path().join("taken_1.fbx").exists());
    }

    #[test]
    fn test_safe_mode_picks_next_free_suffix() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        touch(&dir.join("f.png"));
        for n in 1..4 {
            touch(&dir.join(format!("f_{}.png", n)));
        }

        let mover = Mover::new(false);
        let resolver = CollisionResolver::new(999, &mover);
        let resolved = resolver
            .resolve(&dir.join("f.png"), false, ExecutionMode::Normal)
            .unwrap();
        assert_eq!(resolved, dir.join("f_4.png"));
    }

    #[test]
    fn test_safe_mode_fills_gaps() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        touch(&dir.join("f.png"));
        touch(&dir.join("f_2.png"));

        let mover = Mover::new(false);
        let resolver = CollisionResolver::new(999, &mover);
        let resolved = resolver
            .resolve(&dir.join("f.png"), false, ExecutionMode::Clean)
            .unwrap();
        assert_eq!(resolved, dir.join("f_1.png"));
    }

    #[test]
    fn test_safe_mode_exhaustion() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        touch(&dir.join("f.glb"));
        touch(&dir.join("f_1.glb"));
        touch(&dir.join("f_2.glb"));

        let mover = Mover::new(false);
        let resolver = CollisionResolver::new(2, &mover);
        let result = resolver.resolve(&dir.join("f.glb"), false, ExecutionMode::Normal);
        assert_eq!(
            result,
            Err(CollisionError::TooManyCollisions {
                path: dir.join("f.glb"),
                limit: 2,
            })
        );
    }

    #[test]
    fn test_reset_mode_purges_suffixed_copies() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        for name in ["f.fbx", "f_1.fbx", "f_2.fbx", "f_x.fbx"] {
            touch(&dir.join(name));
        }

        let mover = Mover::new(false);
        let resolver = CollisionResolver::new(999, &mover);
        let resolved = resolver
            .resolve(&dir.join("f.fbx"), false, ExecutionMode::ResetOverwrite)
            .unwrap();

        assert_eq!(resolved, dir.join("f.fbx"));
        assert!(dir.join("f.fbx").exists());
        assert!(!dir.join("f_1.fbx").exists());
        assert!(!dir.join("f_2.fbx").exists());
        assert!(dir.join("f_x.fbx").exists());
    }

    #[test]
    fn test_reset_mode_purge_continues_past_failed_removal() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        touch(&dir.join("f.fbx"));
        // A non-empty directory under a suffixed name cannot be removed as a file
        fs::create_dir(dir.join("f_1.fbx")).unwrap();
        touch(&dir.join("f_1.fbx").join("keep"));
        touch(&dir.join("f_2.fbx"));
        touch(&dir.join("f_3.fbx"));

        let mover = Mover::new(false);
        let resolver = CollisionResolver::new(999, &mover);
        let resolved = resolver
            .resolve(&dir.join("f.fbx"), false, ExecutionMode::ResetOverwrite)
            .unwrap();

        assert_eq!(resolved, dir.join("f.fbx"));
        assert!(dir.join("f_1.fbx").join("keep").exists());
        assert!(!dir.join("f_2.fbx").exists());
        assert!(!dir.join("f_3.fbx").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_safe_mode_suffix_keeps_raw_name() {
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dest = temp_dir.path().join(OsStr::from_bytes(b"mesh\xff.fbx"));
        touch(&dest);

        let mover = Mover::new(false);
        let resolver = CollisionResolver::new(999, &mover);
        let resolved = resolver.resolve(&dest, false, ExecutionMode::Normal).unwrap();
        assert_eq!(
            resolved,
            temp_dir.path().join(OsStr::from_bytes(b"mesh\xff_1.fbx"))
        );
    }

    #[test]
    fn test_reset_mode_dry_run_deletes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path();
        touch(&dir.join("f.fbx"));
        touch(&dir.join("f_1.fbx"));

        let mover = Mover::new(true);
        let resolver = CollisionResolver::new(999, &mover);
        let resolved = resolver
            .resolve(&dir.join("f.fbx"), false, ExecutionMode::ResetOverwrite)
            .unwrap();

        assert_eq!(resolved, dir.join("f.fbx"));
        assert!(dir.join("f_1.fbx").exists());
    }
}
