//! Breadcrumb stack from the synthetic root to the open folder.

use std::fmt;

use crate::api::{FolderSummary, ROOT_FOLDER_ID, ROOT_FOLDER_NAME};

/// Breadcrumb labels longer than this are shortened.
const LABEL_MAX_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPathEntry {
    pub id: String,
    pub name: String,
}

impl FolderPathEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_FOLDER_ID, ROOT_FOLDER_NAME)
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_FOLDER_ID
    }

    /// Name shortened for breadcrumb display ("Long folder nam...").
    pub fn label(&self) -> String {
        if self.name.chars().count() > LABEL_MAX_CHARS {
            let short: String = self.name.chars().take(LABEL_MAX_CHARS).collect();
            format!("{short}...")
        } else {
            self.name.clone()
        }
    }
}

impl From<FolderSummary> for FolderPathEntry {
    fn from(folder: FolderSummary) -> Self {
        Self::new(folder.id, folder.name)
    }
}

/// Ordered path whose first element is always the root.
///
/// The root is stored apart from the descendants, so an empty path cannot
/// be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    root: FolderPathEntry,
    descendants: Vec<FolderPathEntry>,
}

impl Default for FolderPath {
    fn default() -> Self {
        Self {
            root: FolderPathEntry::root(),
            descendants: Vec::new(),
        }
    }
}

impl FolderPath {
    pub fn len(&self) -> usize {
        self.descendants.len() + 1
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &FolderPathEntry> {
        std::iter::once(&self.root).chain(self.descendants.iter())
    }

    pub fn current(&self) -> &FolderPathEntry {
        self.descendants.last().unwrap_or(&self.root)
    }

    pub fn is_root(&self) -> bool {
        self.descendants.is_empty()
    }

    pub fn push(&mut self, entry: FolderPathEntry) {
        self.descendants.push(entry);
    }

    pub fn reset(&mut self) {
        self.descendants.clear();
    }

    /// Keeps `path[0..=index]`.
    ///
    /// # Panics
    /// If `index` is outside the current path. Callers only pass indexes of
    /// breadcrumbs they were shown.
    pub fn truncate_to(&mut self, index: usize) {
        assert!(
            index < self.len(),
            "breadcrumb index {index} out of range for path of length {}",
            self.len()
        );
        self.descendants.truncate(index);
    }

    /// Shortened labels, root first.
    pub fn labels(&self) -> Vec<String> {
        self.iter().map(FolderPathEntry::label).collect()
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|e| e.name.as_str()).collect();
        write!(f, "{}", names.join(" / "))
    }
}
