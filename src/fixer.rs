//! Run orchestration.
//!
//! A run has up to three phases, always in this order:
//!
//! 1. flatten every component folder (only in modes that flatten)
//! 2. sort root files into component folders by name matching
//! 3. create the category folders inside each component folder and sort
//!    its top-level files into them by extension
//!
//! The candidate folder list is scanned once up front and reused by every
//! phase.

use crate::collision::CollisionResolver;
use crate::config::Rules;
use crate::file_organizer::{Mover, OrganizeResult, files_are_identical};
use crate::flatten::Flattener;
use crate::matcher::{FolderMatcher, MatchTier, scan_candidate_folders};
use crate::mode::ExecutionMode;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Log label for extension-based moves.
const EXTENSION_LABEL: &str = "EXT";

/// Tally of a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub moved: usize,
    pub skipped: usize,
    pub unmatched: usize,
    pub failed: usize,
    pub folders_created: usize,
    pub folders_cleaned: usize,
    pub cleanup_moved: usize,
    pub duration: Duration,
}

impl RunStats {
    /// Duration as `MM:SS`.
    pub fn duration_display(&self) -> String {
        let secs = self.duration.as_secs();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

/// A file listed for sorting.
struct ListedFile {
    path: PathBuf,
    /// On-disk name, used to build destinations.
    file_name: OsString,
    /// Lossy form for matching, classification and logging.
    name: String,
}

/// Organizes one working directory under a fixed mode.
pub struct FolderFixer<'a> {
    root: PathBuf,
    rules: &'a Rules,
    mode: ExecutionMode,
    mover: Mover,
}

impl<'a> FolderFixer<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        rules: &'a Rules,
        mode: ExecutionMode,
        dry_run: bool,
    ) -> Self {
        Self {
            root: root.into(),
            rules,
            mode,
            mover: Mover::new(dry_run),
        }
    }

    /// Runs every phase the mode calls for.
    ///
    /// Only a failure to list the working directory aborts the run. Every
    /// per-file problem is logged and counted in the returned [`RunStats`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use folderfix::config::Rules;
    /// use folderfix::fixer::FolderFixer;
    /// use folderfix::mode::ExecutionMode;
    ///
    /// let rules = Rules::default();
    /// let fixer = FolderFixer::new("/work/assets", &rules, ExecutionMode::Clean, true);
    /// let stats = fixer.run().expect("working directory unreadable");
    /// println!("{} files would move", stats.moved);
    /// ```
    pub fn run(&self) -> OrganizeResult<RunStats> {
        let started = Instant::now();
        let mut stats = RunStats::default();

        log::info!("Scanning subfolders...");
        let folders = scan_candidate_folders(
            &self.root,
            &self.rules.classifier,
            self.rules.sort_candidates,
        )?;

        log::info!("Executing mode {}...", self.mode);
        if self.mode.flattens() {
            self.flatten_phase(&folders, &mut stats);
        }

        let matcher = FolderMatcher::new(folders);
        self.root_sorter_phase(&matcher, &mut stats);
        self.structure_phase(&matcher, &mut stats);

        stats.duration = started.elapsed();
        Ok(stats)
    }

    fn flatten_phase(&self, folders: &[String], stats: &mut RunStats) {
        log::info!("Deep cleanup phase: recursively flattening subfolders...");
        let flattener = Flattener::new(self.rules, self.mode, &self.mover);

        for name in folders {
            let component = self.root.join(name);
            if !component.is_dir() {
                continue;
            }
            log::info!("Processing cleanup for: {}", name);
            let report = flattener.flatten(&component);
            stats.cleanup_moved += report.moved;
            stats.skipped += report.skipped;
            stats.failed += report.failed;
            stats.folders_cleaned += report.folders_deleted;
        }
    }

    fn root_sorter_phase(&self, matcher: &FolderMatcher, stats: &mut RunStats) {
        log::info!("Root file sorter phase...");
        let files = match self.list_files(&self.root) {
            Ok(files) => files,
            Err(e) => {
                log::error!("Error processing root files: {}", e);
                return;
            }
        };

        let resolver = CollisionResolver::new(self.rules.collision_limit, &self.mover);
        let allow_overwrite = self.mode.allows_overwrite();

        for ListedFile {
            path,
            file_name,
            name,
        } in files
        {
            if !self.rules.classifier.is_supported(&name) {
                log::debug!("Skipping unsupported file: {}", name);
                continue;
            }

            let result = matcher.find(&name);
            let folder = match (&result.folder, result.tier) {
                (Some(folder), tier) if tier != MatchTier::None => folder,
                _ => {
                    log::warn!("[NONE] No matching folder found for: {}", name);
                    stats.unmatched += 1;
                    continue;
                }
            };

            let folder_path = self.root.join(folder);
            if !folder_path.is_dir() {
                log::error!("Folder not found: {}", folder);
                stats.unmatched += 1;
                continue;
            }
            log::debug!("[{}] {} -> {}", result.tier, name, folder);

            let mut destination = folder_path.join(&file_name);
            if destination.exists() && !files_are_identical(&path, &destination) {
                match resolver.resolve(&destination, allow_overwrite, self.mode) {
                    Ok(resolved) => destination = resolved,
                    Err(e) => {
                        log::error!("{}, skipping: {}", e, name);
                        stats.failed += 1;
                        continue;
                    }
                }
            }

            match self
                .mover
                .move_file(&path, &destination, result.tier.label(), allow_overwrite)
            {
                Ok(outcome) if outcome.is_moved() => stats.moved += 1,
                Ok(_) => stats.skipped += 1,
                Err(_) => stats.failed += 1,
            }
        }
    }

    fn structure_phase(&self, matcher: &FolderMatcher, stats: &mut RunStats) {
        log::info!("Subfolder structure phase...");
        for name in matcher.candidates() {
            let component = self.root.join(name);
            if !component.is_dir() {
                continue;
            }
            log::info!("Processing subfolder: {}", name);
            self.create_category_folders(&component, stats);
            self.sort_by_extension(&component, stats);
        }
    }

    fn create_category_folders(&self, component: &Path, stats: &mut RunStats) {
        for category in self.rules.classifier.categories() {
            match self.mover.create_dir(&component.join(category.folder())) {
                Ok(true) => stats.folders_created += 1,
                Ok(false) => {}
                Err(e) => log::error!("{}", e),
            }
        }
    }

    fn sort_by_extension(&self, component: &Path, stats: &mut RunStats) {
        let files = match self.list_files(component) {
            Ok(files) => files,
            Err(e) => {
                log::error!("Error sorting files in {}: {}", component.display(), e);
                return;
            }
        };

        let resolver = CollisionResolver::new(self.rules.collision_limit, &self.mover);
        let allow_overwrite = self.mode.allows_overwrite();

        for ListedFile {
            path,
            file_name,
            name,
        } in files
        {
            let Some(category) = self.rules.classifier.classify_file(&name) else {
                continue;
            };

            let mut destination = component.join(category.folder()).join(&file_name);
            if destination.exists() && !files_are_identical(&path, &destination) {
                match resolver.resolve(&destination, allow_overwrite, self.mode) {
                    Ok(resolved) => destination = resolved,
                    Err(e) => {
                        log::error!("{}, skipping: {}", e, name);
                        stats.skipped += 1;
                        continue;
                    }
                }
            }

            match self
                .mover
                .move_file(&path, &destination, EXTENSION_LABEL, allow_overwrite)
            {
                Ok(outcome) if outcome.is_moved() => stats.moved += 1,
                Ok(_) => stats.skipped += 1,
                Err(_) => stats.failed += 1,
            }
        }
    }

    /// Regular, non-hidden, non-excluded files directly inside `dir`, by name.
    fn list_files(&self, dir: &Path) -> std::io::Result<Vec<ListedFile>> {
        let mut files: Vec<ListedFile> = fs::read_dir(dir)?
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| {
                let file_name = entry.file_name();
                ListedFile {
                    path: entry.path(),
                    name: file_name.to_string_lossy().to_string(),
                    file_name,
                }
            })
            .filter(|file| self.rules.filters.should_include(&file.name))
            .collect();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }
}
