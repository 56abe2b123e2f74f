/// Extension-based classification into category folders.
///
/// Every component folder carries the same fixed set of category folders.
/// Each category owns a set of extensions; the sets never overlap, so an
/// extension belongs to at most one category.
///
/// # Examples
///
/// ```
/// use folderfix::file_category::ExtensionClassifier;
///
/// let classifier = ExtensionClassifier::default();
/// assert_eq!(classifier.classify(".FBX").map(|c| c.folder()), Some("Maya-Blender files"));
/// assert_eq!(classifier.classify(".png").map(|c| c.folder()), Some("MD files"));
/// assert!(classifier.classify(".txt").is_none());
/// ```
use crate::config::ConfigError;
use crate::naming::split_extension;
use std::collections::HashMap;

/// A category folder together with the extensions it collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFolder {
    folder: String,
    extensions: Vec<String>,
}

impl CategoryFolder {
    /// Creates a category, normalising extensions to lowercase with a leading dot.
    pub fn new<I, S>(folder: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = normalize_extension(ext.as_ref());
            if !ext.is_empty() && !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        Self {
            folder: folder.into(),
            extensions: normalized,
        }
    }

    /// The folder name created inside every component folder.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

/// The built-in category table.
pub fn standard_categories() -> Vec<CategoryFolder> {
    vec![
        CategoryFolder::new(
            "Maya-Blender files",
            [".fbx", ".blend", ".blend1", ".ma", ".mb"],
        ),
        CategoryFolder::new("MD files", [".zprj", ".png"]),
        CategoryFolder::new("Output format files", [".glb"]),
    ]
}

/// Lowercases an extension and makes sure it starts with a dot.
///
/// ```
/// use folderfix::file_category::normalize_extension;
///
/// assert_eq!(normalize_extension("FBX"), ".fbx");
/// assert_eq!(normalize_extension(" .Glb "), ".glb");
/// assert_eq!(normalize_extension(""), "");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Maps extensions to their category folder.
#[derive(Debug, Clone)]
pub struct ExtensionClassifier {
    categories: Vec<CategoryFolder>,
    extension_map: HashMap<String, usize>,
}

impl ExtensionClassifier {
    /// Builds a classifier, rejecting empty, duplicate or overlapping categories.
    pub fn new(categories: Vec<CategoryFolder>) -> Result<Self, ConfigError> {
        if categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        let mut extension_map = HashMap::new();
        for (idx, category) in categories.iter().enumerate() {
            if category.folder.trim().is_empty() {
                return Err(ConfigError::EmptyCategoryName);
            }
            if category.extensions.is_empty() {
                return Err(ConfigError::EmptyExtensionSet(category.folder.clone()));
            }
            if categories[..idx].iter().any(|c| c.folder == category.folder) {
                return Err(ConfigError::DuplicateCategory(category.folder.clone()));
            }

            for ext in &category.extensions {
                if let Some(&previous) = extension_map.get(ext) {
                    let first: &CategoryFolder = &categories[previous];
                    return Err(ConfigError::OverlappingExtension {
                        extension: ext.clone(),
                        first: first.folder.clone(),
                        second: category.folder.clone(),
                    });
                }
                extension_map.insert(ext.clone(), idx);
            }
        }

        Ok(Self {
            categories,
            extension_map,
        })
    }

    /// Returns the category owning `ext` (leading dot included, any case).
    pub fn classify(&self, ext: &str) -> Option<&CategoryFolder> {
        self.extension_map
            .get(&normalize_extension(ext))
            .map(|&idx| &self.categories[idx])
    }

    /// Classifies a bare filename by its extension.
    pub fn classify_file(&self, filename: &str) -> Option<&CategoryFolder> {
        let (_, ext) = split_extension(filename);
        if ext.is_empty() {
            return None;
        }
        self.classify(ext)
    }

    /// True if files with this name take part in sorting at all.
    pub fn is_supported(&self, filename: &str) -> bool {
        self.classify_file(filename).is_some()
    }

    /// True if `name` is one of the category folder names (exact match).
    pub fn is_category_folder(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.folder == name)
    }

    pub fn categories(&self) -> &[CategoryFolder] {
        &self.categories
    }
}

impl Default for ExtensionClassifier {
    fn default() -> Self {
        let categories = standard_categories();
        let extension_map = categories
            .iter()
            .enumerate()
            .flat_map(|(idx, c)| c.extensions.iter().map(move |ext| (ext.clone(), idx)))
            .collect();
        Self {
            categories,
            extension_map,
        }
    }
}
