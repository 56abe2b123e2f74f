//! Recursive flattening of component folders.
//!
//! Every file nested anywhere below a component folder is pulled up to the
//! component folder itself, then the emptied directories are removed
//! deepest-first. Category folders found below the component folder are
//! torn down too; the structure phase recreates them afterwards.
//!
//! Failures on individual files or directories are logged and counted, and
//! the walk carries on.

use crate::collision::CollisionResolver;
use crate::config::Rules;
use crate::file_organizer::{DirRemoval, Mover, files_are_identical};
use crate::mode::ExecutionMode;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Log label for moves made while flattening.
const CLEANUP_LABEL: &str = "CLEANUP";

/// A file found below the component folder.
#[derive(Debug, Clone)]
struct NestedFile {
    path: PathBuf,
    /// The name as stored on disk; destinations are built from this.
    file_name: OsString,
    /// Lossy form for filters and log lines.
    name: String,
}

/// Counters for a single component folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenReport {
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub folders_deleted: usize,
}

impl FlattenReport {
    /// True if the run changed (or would change) nothing.
    pub fn is_noop(&self) -> bool {
        self.moved == 0 && self.folders_deleted == 0
    }
}

/// Flattens component folders under one execution mode.
pub struct Flattener<'a> {
    rules: &'a Rules,
    mode: ExecutionMode,
    mover: &'a Mover,
    resolver: CollisionResolver<'a>,
}

impl<'a> Flattener<'a> {
    pub fn new(rules: &'a Rules, mode: ExecutionMode, mover: &'a Mover) -> Self {
        Self {
            rules,
            mode,
            mover,
            resolver: CollisionResolver::new(rules.collision_limit, mover),
        }
    }

    /// Flattens `component` so that it has no nested directories left,
    /// except those still holding files that could not be moved.
    pub fn flatten(&self, component: &Path) -> FlattenReport {
        let mut report = FlattenReport::default();
        let (files, mut folders, mut left_behind) = self.collect(component);

        if files.is_empty() && folders.is_empty() {
            log::info!(
                "No files or subfolders found in: {}",
                display_name(component)
            );
            return report;
        }

        log::info!("Found {} files to move from subfolders", files.len());
        log::debug!(
            "Found {} subfolders to process ({})",
            folders.len(),
            if self.mode.allows_overwrite() {
                "Overwrite"
            } else {
                "Safe"
            }
        );

        let root_files = self.root_file_names(component);

        for file in &files {
            if self.place(component, file, &root_files, &mut report) {
                continue;
            }
            left_behind.push(file.path.clone());
        }

        folders.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
        for dir in &folders {
            self.remove_folder(dir, &left_behind, &mut report);
        }

        log::debug!(
            "Cleanup summary: {} moved, {} skipped, {} failed, {} folders deleted",
            report.moved,
            report.skipped,
            report.failed,
            report.folders_deleted
        );
        report
    }

    /// Walks the subtree below `component`, returning nested files to move,
    /// every nested directory, and files that will never be moved.
    fn collect(&self, component: &Path) -> (Vec<NestedFile>, Vec<PathBuf>, Vec<PathBuf>) {
        let mut files = Vec::new();
        let mut folders = Vec::new();
        let mut left_behind = Vec::new();

        let walker = WalkDir::new(component)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::error!("Error accessing {}: {}", component.display(), e);
                    if let Some(path) = e.path() {
                        left_behind.push(path.to_path_buf());
                    }
                    continue;
                }
            };

            let path = entry.path().to_path_buf();
            if entry.file_type().is_dir() {
                log::debug!("Found folder: {}", relative(component, &path));
                folders.push(path);
                continue;
            }

            // Top-level files are already in place.
            if entry.depth() == 1 {
                continue;
            }

            let file_name = entry.file_name().to_os_string();
            let name = file_name.to_string_lossy().to_string();
            if !entry.file_type().is_file() || !self.rules.filters.should_include(&name) {
                log::debug!("Leaving in place: {}", relative(component, &path));
                left_behind.push(path);
                continue;
            }

            log::debug!("Found file: {}", relative(component, &path));
            files.push(NestedFile {
                path,
                file_name,
                name,
            });
        }

        log::debug!(
            "Collection complete: {} files, {} folders",
            files.len(),
            folders.len()
        );
        (files, folders, left_behind)
    }

    /// Names of the files sitting next to the component folder. Symlinks
    /// count when they resolve to a file.
    fn root_file_names(&self, component: &Path) -> HashSet<OsString> {
        let Some(root) = component.parent() else {
            return HashSet::new();
        };
        match fs::read_dir(root) {
            Ok(entries) => entries
                .flatten()
                .filter(|entry| entry.path().is_file())
                .map(|entry| entry.file_name())
                .collect(),
            Err(e) => {
                log::debug!("Could not scan root directory: {}", e);
                HashSet::new()
            }
        }
    }

    /// Moves one nested file to the top of the component folder.
    /// Returns false if the file stays where it is.
    fn place(
        &self,
        component: &Path,
        file: &NestedFile,
        root_files: &HashSet<OsString>,
        report: &mut FlattenReport,
    ) -> bool {
        if self.mode.skips_root_conflicts() && root_files.contains(&file.file_name) {
            log::info!(
                "Keeping both files, root takes precedence: {}",
                file.name
            );
            report.skipped += 1;
            return false;
        }

        let mut destination = component.join(&file.file_name);
        if destination.exists() && !files_are_identical(&file.path, &destination) {
            // Reset mode purges stale `_N` copies before overwriting the
            // unsuffixed name, so the resolver must not short-circuit.
            let resolve_with_overwrite =
                self.mode.allows_overwrite() && !self.mode.purges_suffixed();
            match self
                .resolver
                .resolve(&destination, resolve_with_overwrite, self.mode)
            {
                Ok(resolved) => destination = resolved,
                Err(e) => {
                    log::error!("{}, skipping: {}", e, file.name);
                    report.skipped += 1;
                    return false;
                }
            }
        }

        match self.mover.move_file(
            &file.path,
            &destination,
            CLEANUP_LABEL,
            self.mode.allows_overwrite(),
        ) {
            Ok(outcome) if outcome.is_moved() => {
                report.moved += 1;
                true
            }
            Ok(_) => {
                report.skipped += 1;
                false
            }
            Err(_) => {
                report.failed += 1;
                false
            }
        }
    }

    fn remove_folder(&self, dir: &Path, left_behind: &[PathBuf], report: &mut FlattenReport) {
        if self.mover.is_dry_run() && left_behind.iter().any(|kept| kept.starts_with(dir)) {
            log::info!("Folder would keep files, not deleting: {}", dir.display());
            return;
        }

        match self.mover.remove_dir_if_empty(dir) {
            Ok(DirRemoval::Removed) => report.folders_deleted += 1,
            Ok(DirRemoval::NotEmpty) => {}
            Err(e) => log::error!("Failed to delete: {}", e),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn relative(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
