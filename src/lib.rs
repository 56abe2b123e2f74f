//! folderfix - sorts production asset files into per-component folders
//!
//! Root-level files are matched to component folders by their underscore
//! tokens, files inside each component folder are bucketed into category
//! folders by extension, and nested folder trees can be flattened first.
//! Layout and filtering rules are configurable via TOML.

pub mod cli;
pub mod collision;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod fixer;
pub mod flatten;
pub mod logging;
pub mod matcher;
pub mod mode;
pub mod naming;
pub mod output;

pub use collision::{CollisionError, CollisionResolver};
pub use config::{CompiledFilters, ConfigError, FixerConfig, Rules};
pub use file_category::{CategoryFolder, ExtensionClassifier};
pub use file_organizer::{MoveOutcome, Mover, OrganizeError};
pub use fixer::{FolderFixer, RunStats};
pub use flatten::{FlattenReport, Flattener};
pub use matcher::{FolderMatcher, MatchResult, MatchTier};
pub use mode::ExecutionMode;
pub use naming::FilenameTokens;

pub use cli::{Args, run_cli};
