//! Folder/file listings derived from the flat key space.
//!
//! A [`NamespaceSnapshot`] is never stored anywhere: it is recomputed from a
//! one-level store listing every time it is needed, so it cannot drift from
//! the objects that actually exist.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::path::{leaf_name, NsPath, SENTINEL_NAME};
use crate::store::{Listing, ObjectStore};

/// Whether a listed name is a folder or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    Folder,
    File,
}

/// One visible child of a listed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    /// Returns `true` if this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// The child folders and files of one path, with sentinels filtered out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceSnapshot {
    folders: BTreeSet<String>,
    files: BTreeSet<String>,
}

impl NamespaceSnapshot {
    /// Builds a snapshot from a raw one-level listing.
    ///
    /// Leaf names are taken verbatim; any name equal to [`SENTINEL_NAME`] is
    /// dropped from both sets.
    pub fn from_listing(listing: &Listing) -> Self {
        let visible = |key: &String| {
            let name = leaf_name(key);
            (name != SENTINEL_NAME).then(|| name.to_string())
        };
        Self {
            folders: listing.prefixes.iter().filter_map(visible).collect(),
            files: listing.objects.iter().filter_map(visible).collect(),
        }
    }

    /// Child folder names, sorted.
    pub fn folders(&self) -> &BTreeSet<String> {
        &self.folders
    }

    /// Child file names, sorted.
    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    /// Returns `true` if there is neither a folder nor a file to show.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    /// Returns `true` if `name` is a child folder.
    pub fn has_folder(&self, name: &str) -> bool {
        self.folders.contains(name)
    }

    /// Returns `true` if `name` is a child file.
    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains(name)
    }

    /// All entries for display: folders first, each group sorted by name.
    pub fn entries(&self) -> Vec<Entry> {
        let folders = self.folders.iter().map(|name| Entry {
            name: name.clone(),
            kind: EntryKind::Folder,
        });
        let files = self.files.iter().map(|name| Entry {
            name: name.clone(),
            kind: EntryKind::File,
        });
        folders.chain(files).collect()
    }
}

/// Lists the immediate children of a path through an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct NamespaceLister {
    store: Arc<dyn ObjectStore>,
}

impl NamespaceLister {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Returns the folders and files directly below `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ListingFailed`] if the store listing fails. The
    ///   contents of `path` are then unknown, which is not the same as empty.
    pub async fn list(&self, path: &NsPath) -> CoreResult<NamespaceSnapshot> {
        let listing = self
            .store
            .list_one_level(&path.as_prefix())
            .await
            .map_err(|source| {
                tracing::warn!(path = %path, error = %source, "listing failed");
                CoreError::ListingFailed {
                    path: path.clone(),
                    source,
                }
            })?;

        let snapshot = NamespaceSnapshot::from_listing(&listing);
        tracing::debug!(
            path = %path,
            folders = snapshot.folders().len(),
            files = snapshot.files().len(),
            "listed path"
        );
        Ok(snapshot)
    }
}
