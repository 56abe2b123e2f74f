//! Layout and filtering configuration.
//!
//! This module loads the category table, collision limit and file filtering
//! rules from TOML, validates them, and compiles them into an immutable
//! [`Rules`] value that the matcher, classifier, resolver and flattener all
//! borrow for the duration of a run.
//!
//! # Configuration File Format
//!
//! ```toml
//! [layout]
//! collision_limit = 999
//! sort_candidates = true
//!
//! [[layout.categories]]
//! folder = "Maya-Blender files"
//! extensions = [".fbx", ".blend", ".blend1", ".ma", ".mb"]
//!
//! [[layout.categories]]
//! folder = "MD files"
//! extensions = [".zprj", ".png"]
//!
//! [filters]
//! hidden_prefixes = [".", "~"]
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*_backup.*"]
//! regex = []
//! ```

use crate::file_category::{CategoryFolder, ExtensionClassifier, standard_categories};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".folderfix.toml";

/// Default bound on `_N` suffix attempts.
pub const DEFAULT_COLLISION_LIMIT: u32 = 999;

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("IO error reading configuration: {0}")]
    IoError(String),
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    #[error("At least one category folder is required")]
    NoCategories,
    #[error("Category folder name must not be empty")]
    EmptyCategoryName,
    #[error("Category '{0}' has no extensions")]
    EmptyExtensionSet(String),
    #[error("Category '{0}' is defined more than once")]
    DuplicateCategory(String),
    #[error("Extension '{extension}' is claimed by both '{first}' and '{second}'")]
    OverlappingExtension {
        extension: String,
        first: String,
        second: String,
    },
    #[error("collision_limit must be at least 1")]
    InvalidCollisionLimit,
}

/// Root of the TOML configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixerConfig {
    #[serde(default)]
    pub layout: LayoutRules,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Category table and matching knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutRules {
    /// Highest `_N` suffix tried before a collision is given up on.
    #[serde(default = "default_collision_limit")]
    pub collision_limit: u32,

    /// Sort candidate folders by name before matching. When false, the
    /// order reported by the filesystem decides ties.
    #[serde(default = "default_sort_candidates")]
    pub sort_candidates: bool,

    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryRule>,
}

/// One `[[layout.categories]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub folder: String,
    pub extensions: Vec<String>,
}

/// Rules deciding which files are left alone entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Names starting with any of these are hidden/system files.
    #[serde(default = "default_hidden_prefixes")]
    pub hidden_prefixes: Vec<String>,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding files from sorting and flattening.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the bare filename.
    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub regex: Vec<String>,
}

fn default_collision_limit() -> u32 {
    DEFAULT_COLLISION_LIMIT
}

fn default_sort_candidates() -> bool {
    true
}

fn default_categories() -> Vec<CategoryRule> {
    standard_categories()
        .into_iter()
        .map(|c| CategoryRule {
            folder: c.folder().to_string(),
            extensions: c.extensions().to_vec(),
        })
        .collect()
}

fn default_hidden_prefixes() -> Vec<String> {
    vec![".".to_string(), "~".to_string()]
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self {
            collision_limit: default_collision_limit(),
            sort_candidates: default_sort_candidates(),
            categories: default_categories(),
        }
    }
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            hidden_prefixes: default_hidden_prefixes(),
            exclude: ExcludeRules::default(),
        }
    }
}

impl FixerConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.folderfix.toml` in `working_dir`
    /// 3. `~/.config/folderfix/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file is missing, or if any
    /// discovered file cannot be read or parsed.
    pub fn load(config_path: Option<&Path>, working_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = working_dir.join(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("folderfix")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validate and compile into the immutable [`Rules`] used for a run.
    pub fn compile(self) -> Result<Rules, ConfigError> {
        if self.layout.collision_limit == 0 {
            return Err(ConfigError::InvalidCollisionLimit);
        }

        let categories = self
            .layout
            .categories
            .into_iter()
            .map(|rule| CategoryFolder::new(rule.folder, rule.extensions))
            .collect();

        Ok(Rules {
            classifier: ExtensionClassifier::new(categories)?,
            filters: CompiledFilters::new(self.filters)?,
            collision_limit: self.layout.collision_limit,
            sort_candidates: self.layout.sort_candidates,
        })
    }
}

/// Everything a run needs to know about layout and filtering, fixed at start.
#[derive(Debug, Clone)]
pub struct Rules {
    pub classifier: ExtensionClassifier,
    pub filters: CompiledFilters,
    pub collision_limit: u32,
    pub sort_candidates: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            classifier: ExtensionClassifier::default(),
            filters: CompiledFilters::default(),
            collision_limit: DEFAULT_COLLISION_LIMIT,
            sort_candidates: true,
        }
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    hidden_prefixes: Vec<String>,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            hidden_prefixes: rules
                .hidden_prefixes
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect(),
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// True for hidden/system files (name starts with a hidden prefix).
    pub fn is_hidden(&self, file_name: &str) -> bool {
        self.hidden_prefixes
            .iter()
            .any(|prefix| file_name.starts_with(prefix.as_str()))
    }

    /// True if a file with this bare name should be sorted or collected.
    ///
    /// Checked in order: hidden prefix, exact filename, glob, regex.
    pub fn should_include(&self, file_name: &str) -> bool {
        if self.is_hidden(file_name) {
            return false;
        }
        if self.exclude_filenames.contains(file_name) {
            return false;
        }
        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
        {
            return false;
        }
        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            hidden_prefixes: default_hidden_prefixes(),
            exclude_filenames: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_compiles() {
        let rules = FixerConfig::default().compile().unwrap();
        assert_eq!(rules.collision_limit, 999);
        assert!(rules.sort_candidates);
        assert_eq!(rules.classifier.categories().len(), 3);
    }

    #[test]
    fn test_hidden_and_system_files_excluded_by_default() {
        let filters = CompiledFilters::default();
        assert!(!filters.should_include(".DS_Store"));
        assert!(!filters.should_include("~$lock.fbx"));
        assert!(filters.should_include("model_U101_v1.fbx"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = FixerConfig::from_toml("").unwrap();
        assert_eq!(config.layout.collision_limit, 999);
        assert_eq!(config.layout.categories.len(), 3);
        assert_eq!(config.filters.hidden_prefixes, vec![".", "~"]);
    }

    #[test]
    fn test_custom_categories_replace_defaults() {
        let toml = r#"
[layout]
sort_candidates = false

[[layout.categories]]
folder = "Scenes"
extensions = ["FBX", ".ma"]

[[layout.categories]]
folder = "Renders"
extensions = [".exr"]
"#;
        let rules = FixerConfig::from_toml(toml).unwrap().compile().unwrap();
        assert!(!rules.sort_candidates);
        assert_eq!(
            rules.classifier.classify(".fbx").map(|c| c.folder()),
            Some("Scenes")
        );
        assert!(rules.classifier.classify(".png").is_none());
    }

    #[test]
    fn test_overlapping_categories_fail_compile() {
        let toml = r#"
[[layout.categories]]
folder = "A"
extensions = [".png"]

[[layout.categories]]
folder = "B"
extensions = ["png"]
"#;
        let result = FixerConfig::from_toml(toml).unwrap().compile();
        assert!(matches!(
            result,
            Err(ConfigError::OverlappingExtension { .. })
        ));
    }

    #[test]
    fn test_zero_collision_limit_rejected() {
        let toml = "[layout]\ncollision_limit = 0\n";
        let result = FixerConfig::from_toml(toml).unwrap().compile();
        assert!(matches!(result, Err(ConfigError::InvalidCollisionLimit)));
    }

    #[test]
    fn test_exclude_rules() {
        let toml = r#"
[filters.exclude]
filenames = ["Thumbs.db"]
patterns = ["*_backup.*"]
regex = ["^wip_"]
"#;
        let rules = FixerConfig::from_toml(toml).unwrap().compile().unwrap();
        let filters = &rules.filters;
        assert!(!filters.should_include("Thumbs.db"));
        assert!(!filters.should_include("hero_backup.fbx"));
        assert!(!filters.should_include("wip_U101_v1.fbx"));
        assert!(filters.should_include("hero_U101_v1.fbx"));
        // Hidden prefixes still apply alongside custom excludes
        assert!(!filters.should_include(".cache"));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let glob = "[filters.exclude]\npatterns = [\"[invalid\"]\n";
        assert!(matches!(
            FixerConfig::from_toml(glob).unwrap().compile(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));

        let regex = "[filters.exclude]\nregex = [\"[invalid(\"]\n";
        assert!(matches!(
            FixerConfig::from_toml(regex).unwrap().compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let result = FixerConfig::from_toml("[layout\ncollision_limit = ");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope.toml");
        let result = FixerConfig::load(Some(&missing), temp_dir.path());
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_local_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(
            temp_dir.path().join(LOCAL_CONFIG_NAME),
            "[layout]\ncollision_limit = 5\n",
        )
        .expect("Failed to write config");

        let config = FixerConfig::load(None, temp_dir.path()).unwrap();
        assert_eq!(config.layout.collision_limit, 5);
    }
}
