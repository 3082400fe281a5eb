//! Object store capability and its backends.
//!
//! The core only ever talks to a store through the [`ObjectStore`] trait,
//! handed in explicitly as an `Arc<dyn ObjectStore>`. Two backends ship with
//! the crate: [`InMemoryStore`] for tests and demos, and [`LocalStore`] which
//! maps keys onto files under a root directory.

pub mod local;
pub mod memory;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{CoreError, CoreResult, StoreError};

pub use local::LocalStore;
pub use memory::{Fault, InMemoryStore};

/// Result of a one-level (delimiter) listing.
///
/// Both sets hold *full* keys: `objects` are the keys directly below the
/// listed prefix, `prefixes` are the child prefixes one level down, without
/// a trailing delimiter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub objects: BTreeSet<String>,
    pub prefixes: BTreeSet<String>,
}

impl Listing {
    /// Returns `true` if nothing lives under the listed prefix.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.prefixes.is_empty()
    }
}

/// A flat, key-addressed blob store with prefix listing.
///
/// Implementations must be safe for concurrent operations on distinct keys;
/// the recursive folder delete issues many of them at once.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Writes `bytes` at `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Deletes the object at `key`.
    ///
    /// A missing object is reported as [`StoreError::NotFound`], distinct
    /// from other delete failures.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Returns a URL the object can be downloaded from.
    async fn download_url(&self, key: &str) -> Result<Url, StoreError>;

    /// Lists the objects and child prefixes directly below `prefix`.
    ///
    /// `""` lists the root. An unknown prefix yields an empty listing.
    async fn list_one_level(&self, prefix: &str) -> Result<Listing, StoreError>;
}

/// Builds the backend selected in `config`.
///
/// # Errors
///
/// - [`CoreError::ConfigParse`] if the memory backend's `base_url` is not a valid URL.
/// - [`CoreError::Io`] if the local backend's root directory cannot be created.
pub fn open(config: &StoreConfig) -> CoreResult<Arc<dyn ObjectStore>> {
    match config.backend {
        StoreBackend::Memory => {
            let base = Url::parse(&config.base_url)
                .map_err(|e| CoreError::ConfigParse(format!("store.base_url: {e}")))?;
            tracing::debug!(base_url = %base, "opening in-memory object store");
            Ok(Arc::new(InMemoryStore::with_base_url(base)))
        }
        StoreBackend::Local => {
            tracing::debug!(root = %config.root.display(), "opening local object store");
            Ok(Arc::new(LocalStore::new(&config.root)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn object_store_is_object_safe() {
        fn _assert_object_safe(_: &dyn ObjectStore) {}
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Arc<dyn ObjectStore>>();
    }

    #[test]
    fn empty_listing() {
        assert!(Listing::default().is_empty());
        let listing = Listing {
            objects: BTreeSet::from(["a.txt".to_string()]),
            prefixes: BTreeSet::new(),
        };
        assert!(!listing.is_empty());
    }

    #[test]
    fn open_memory_backend() {
        let config = StoreConfig::default();
        assert!(open(&config).is_ok());
    }

    #[test]
    fn open_memory_backend_rejects_bad_url() {
        let config = StoreConfig {
            base_url: "not a url".to_string(),
            ..StoreConfig::default()
        };
        assert!(matches!(open(&config), Err(CoreError::ConfigParse(_))));
    }

    #[test]
    fn open_local_backend_creates_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("bucket");
        let config = StoreConfig {
            backend: StoreBackend::Local,
            root: root.clone(),
            ..StoreConfig::default()
        };
        assert!(open(&config).is_ok());
        assert!(root.is_dir());
    }
}
