//! Priority-based filename to component folder matching.
//!
//! Tiers are tried strictly in order and the first hit wins:
//!
//! 1. `FULL` - the filename stem equals a folder name
//! 2. `BASE+VER` - a folder name contains `<basefit>_<version>`
//! 3. `BASE` - a folder name contains `<basefit>`
//! 4. `NONE` - nothing matched, the file stays where it is
//!
//! All comparisons are case-insensitive and ignore surrounding whitespace.
//! Within a tier, candidate order decides the winner.

use crate::file_category::ExtensionClassifier;
use crate::file_organizer::OrganizeError;
use crate::naming::{FilenameTokens, normalize_name};
use std::fmt;
use std::fs;
use std::path::Path;

/// Which comparison rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTier {
    Full,
    BaseVersion,
    Base,
    None,
}

impl MatchTier {
    pub fn label(self) -> &'static str {
        match self {
            MatchTier::Full => "FULL",
            MatchTier::BaseVersion => "BASE+VER",
            MatchTier::Base => "BASE",
            MatchTier::None => "NONE",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The chosen folder (if any) and the tier that chose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub folder: Option<String>,
    pub tier: MatchTier,
}

impl MatchResult {
    fn hit(folder: &str, tier: MatchTier) -> Self {
        Self {
            folder: Some(folder.to_string()),
            tier,
        }
    }

    fn miss() -> Self {
        Self {
            folder: None,
            tier: MatchTier::None,
        }
    }
}

/// Matches filenames against a fixed list of candidate folders.
#[derive(Debug, Clone)]
pub struct FolderMatcher {
    /// `(original name, normalized name)` in matching order.
    candidates: Vec<(String, String)>,
}

impl FolderMatcher {
    pub fn new(candidates: Vec<String>) -> Self {
        let candidates = candidates
            .into_iter()
            .map(|name| {
                let normalized = normalize_name(&name);
                (name, normalized)
            })
            .collect();
        Self { candidates }
    }

    /// Candidate folder names in matching order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|(name, _)| name.as_str())
    }

    /// Finds the destination folder for `filename`.
    ///
    /// # Examples
    ///
    /// ```
    /// use folderfix::matcher::{FolderMatcher, MatchTier};
    ///
    /// let matcher = FolderMatcher::new(vec![
    ///     "Sandhya_U101_Main".to_string(),
    ///     "OtherFolder".to_string(),
    /// ]);
    /// let result = matcher.find("sandhya1_U101_v1.fbx");
    /// assert_eq!(result.folder.as_deref(), Some("Sandhya_U101_Main"));
    /// assert_eq!(result.tier, MatchTier::Base);
    /// ```
    pub fn find(&self, filename: &str) -> MatchResult {
        let tokens = FilenameTokens::parse(filename);
        let stem = normalize_name(&tokens.stem);

        if let Some((name, _)) = self.candidates.iter().find(|(_, norm)| *norm == stem) {
            return MatchResult::hit(name, MatchTier::Full);
        }

        if !tokens.basefit_version.is_empty()
            && let Some(name) = self.first_containing(&tokens.basefit_version)
        {
            return MatchResult::hit(name, MatchTier::BaseVersion);
        }

        if !tokens.basefit.is_empty()
            && let Some(name) = self.first_containing(&tokens.basefit)
        {
            return MatchResult::hit(name, MatchTier::Base);
        }

        MatchResult::miss()
    }

    fn first_containing(&self, needle: &str) -> Option<&str> {
        let needle = normalize_name(needle);
        self.candidates
            .iter()
            .find(|(_, norm)| norm.contains(&needle))
            .map(|(name, _)| name.as_str())
    }
}

/// Lists the first-level directories of `root_dir` that are not category
/// folders. Sorted by name when `sorted` is set, else in listing order.
pub fn scan_candidate_folders(
    root_dir: &Path,
    classifier: &ExtensionClassifier,
    sorted: bool,
) -> Result<Vec<String>, OrganizeError> {
    let entries = fs::read_dir(root_dir).map_err(|e| OrganizeError::ReadDirFailed {
        path: root_dir.to_path_buf(),
        source: e,
    })?;

    let mut folders = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", root_dir.display(), e);
                continue;
            }
        };
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !classifier.is_category_folder(&name) {
            folders.push(name);
        }
    }

    if sorted {
        folders.sort();
    }
    log::info!("Scanned folders: {} found", folders.len());
    Ok(folders)
}
