//! Filename decomposition and name normalisation.
//!
//! Asset files follow a `<template>_<basefit>_<version>[_...].<ext>` naming
//! convention. The pieces extracted here drive the looser matching tiers in
//! [`crate::matcher`].

use std::ffi::{OsStr, OsString};

/// Delimiter between filename tokens.
pub const TOKEN_DELIMITER: char = '_';

/// Tokens extracted from a single filename.
///
/// Missing positions are empty strings, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilenameTokens {
    /// The filename with its extension removed.
    pub stem: String,
    pub part1: String,
    pub part2: String,
    pub part3: String,
    /// `part2 + "_" + part3` when the stem has at least three tokens.
    pub basefit_version: String,
    /// `part2` when the stem has at least two tokens.
    pub basefit: String,
}

impl FilenameTokens {
    /// Decomposes `filename` into its tokens.
    ///
    /// # Examples
    ///
    /// ```
    /// use folderfix::naming::FilenameTokens;
    ///
    /// let tokens = FilenameTokens::parse("sandhya1_U101_v1.fbx");
    /// assert_eq!(tokens.basefit, "U101");
    /// assert_eq!(tokens.basefit_version, "U101_v1");
    ///
    /// let bare = FilenameTokens::parse("notes.png");
    /// assert_eq!(bare.part1, "notes");
    /// assert!(bare.basefit.is_empty());
    /// ```
    pub fn parse(filename: &str) -> Self {
        let (stem, _) = split_extension(filename);
        let parts: Vec<&str> = stem.split(TOKEN_DELIMITER).collect();

        let part = |i: usize| parts.get(i).copied().unwrap_or_default().to_string();
        let part1 = part(0);
        let part2 = part(1);
        let part3 = part(2);

        let basefit_version = if parts.len() >= 3 {
            format!("{}{}{}", part2, TOKEN_DELIMITER, part3)
        } else {
            String::new()
        };
        let basefit = if parts.len() >= 2 {
            part2.clone()
        } else {
            String::new()
        };

        Self {
            stem: stem.to_string(),
            part1,
            part2,
            part3,
            basefit_version,
            basefit,
        }
    }
}

/// Lowercases and trims a name for comparison.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().trim().to_string()
}

/// Splits a filename into `(stem, extension)`, the extension keeping its dot.
///
/// Leading dots belong to the stem, so `.bashrc` has no extension.
///
/// ```
/// use folderfix::naming::split_extension;
///
/// assert_eq!(split_extension("model.v2.fbx"), ("model.v2", ".fbx"));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// assert_eq!(split_extension("README"), ("README", ""));
/// ```
pub fn split_extension(filename: &str) -> (&str, &str) {
    let leading_dots = filename.len() - filename.trim_start_matches('.').len();
    match filename[leading_dots..].rfind('.') {
        Some(idx) => filename.split_at(leading_dots + idx),
        None => (filename, ""),
    }
}

/// Builds `<stem>_<n><ext>` for collision suffixes.
pub fn suffixed_name(filename: &str, n: u32) -> String {
    let (stem, ext) = split_extension(filename);
    format!("{}{}{}{}", stem, TOKEN_DELIMITER, n, ext)
}

/// [`suffixed_name`] for on-disk names, which need not be valid UTF-8.
///
/// The bytes of a non-UTF-8 name are kept as they are.
pub fn suffixed_os_name(filename: &OsStr, n: u32) -> OsString {
    match filename.to_str() {
        Some(name) => suffixed_name(name, n).into(),
        None => suffixed_raw_name(filename, n),
    }
}

#[cfg(unix)]
fn suffixed_raw_name(filename: &OsStr, n: u32) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let bytes = filename.as_bytes();
    let leading_dots = bytes.iter().take_while(|&&b| b == b'.').count();
    let split = bytes[leading_dots..]
        .iter()
        .rposition(|&b| b == b'.')
        .map_or(bytes.len(), |idx| leading_dots + idx);
    let (stem, ext) = bytes.split_at(split);

    let mut name = stem.to_vec();
    name.extend_from_slice(format!("{}{}", TOKEN_DELIMITER, n).as_bytes());
    name.extend_from_slice(ext);
    OsString::from_vec(name)
}

#[cfg(not(unix))]
fn suffixed_raw_name(filename: &OsStr, n: u32) -> OsString {
    suffixed_name(&filename.to_string_lossy(), n).into()
}
