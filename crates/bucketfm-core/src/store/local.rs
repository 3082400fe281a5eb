//! Object store backed by a local directory.
//!
//! Objects and prefixes live in separate namespaces, as on a real object
//! store, so `report` may be both an object and a prefix. On disk every
//! prefix segment is a directory named `<segment>.prefix` and every object
//! is a file named `<segment>.object`; nothing else below the root is part
//! of the store. Writes go through a temporary sibling file and a rename so
//! a reader never observes a half-written object. Directories only exist to
//! hold keys: deleting the last object under a prefix prunes the now-empty
//! directories, just as the prefix disappears from a real object store.
//!
//! New objects are written under the NFC form of their key. Lookups try the
//! exact key first and then its NFC form, so keys listed from disk always
//! round-trip, including decomposed names created by other tools.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use unicode_normalization::UnicodeNormalization;
use url::Url;

use super::{Listing, ObjectStore};
use crate::error::StoreError;
use crate::path::DELIMITER;

/// File name suffix of stored objects.
const OBJECT_SUFFIX: &str = ".object";
/// Directory name suffix of prefixes.
const PREFIX_SUFFIX: &str = ".prefix";
/// File name suffix of in-flight temporary files. Never listed.
const TMP_SUFFIX: &str = ".tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Object store rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    /// Writers hold this shared while they create directories and files;
    /// pruning holds it exclusively so it never removes a directory a
    /// concurrent write is about to fill.
    dirs: Arc<RwLock<()>>,
}

impl LocalStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the root directory cannot be created.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            dirs: Arc::new(RwLock::new(())),
        })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file that holds the object `key`, without touching disk.
    ///
    /// Returns `None` for keys with empty, `.` or `..` segments or a NUL
    /// byte, which could otherwise escape the root.
    pub fn object_path(&self, key: &str) -> Option<PathBuf> {
        let (parent, leaf) = match key.rsplit_once(DELIMITER) {
            Some((parent, leaf)) => (parent, leaf),
            None => ("", key),
        };
        if !valid_segment(leaf) {
            return None;
        }
        let mut path = self.prefix_dir(parent)?;
        path.push(format!("{leaf}{OBJECT_SUFFIX}"));
        Some(path)
    }

    /// Returns the directory that holds the children of `prefix`.
    fn prefix_dir(&self, prefix: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        if prefix.is_empty() {
            return Some(path);
        }
        for seg in prefix.split(DELIMITER) {
            if !valid_segment(seg) {
                return None;
            }
            path.push(format!("{seg}{PREFIX_SUFFIX}"));
        }
        Some(path)
    }

    /// Finds the file currently holding `key`: the exact name first, then
    /// the NFC form new objects are written under.
    async fn find_object(&self, key: &str) -> Option<PathBuf> {
        let exact = self.object_path(key)?;
        if is_file(&exact).await {
            return Some(exact);
        }
        let normalized = self.object_path(&nfc(key))?;
        if normalized != exact && is_file(&normalized).await {
            return Some(normalized);
        }
        None
    }

    /// Removes empty directories from `dir` upwards, stopping at the root.
    async fn prune_empty_dirs(&self, mut dir: Option<&Path>) {
        let _guard = self.dirs.write().await;
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(current).await.is_err() {
                break;
            }
            tracing::trace!(dir = %current.display(), "pruned empty prefix directory");
            dir = current.parent();
        }
    }
}

fn valid_segment(seg: &str) -> bool {
    !(seg.is_empty() || seg == "." || seg == ".." || seg.contains('\0'))
}

fn nfc(key: &str) -> String {
    key.nfc().collect()
}

async fn is_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn invalid_key(key: &str) -> String {
    format!("invalid key {key:?}")
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let write_err = |message: String| StoreError::Write {
            key: key.to_string(),
            message,
        };

        let _guard = self.dirs.read().await;
        // Replace an existing object in place rather than adding its NFC twin.
        let target = match self.find_object(key).await {
            Some(existing) => existing,
            None => self
                .object_path(&nfc(key))
                .ok_or_else(|| write_err(invalid_key(key)))?,
        };
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| write_err(invalid_key(key)))?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_err(e.to_string()))?;
        }

        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = target.with_file_name(format!(".{file_name}.{n}{TMP_SUFFIX}"));
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| write_err(e.to_string()))?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(e.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let not_found = || StoreError::NotFound {
            key: key.to_string(),
        };

        let target = {
            let _guard = self.dirs.read().await;
            let target = self.find_object(key).await.ok_or_else(not_found)?;
            fs::remove_file(&target).await.map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    not_found()
                } else {
                    StoreError::Delete {
                        key: key.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;
            target
        };

        self.prune_empty_dirs(target.parent()).await;
        Ok(())
    }

    async fn download_url(&self, key: &str) -> Result<Url, StoreError> {
        let read_err = |message: String| StoreError::Read {
            key: key.to_string(),
            message,
        };

        let target = self
            .find_object(key)
            .await
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })?;

        let canonical = fs::canonicalize(&target)
            .await
            .map_err(|e| read_err(e.to_string()))?;
        Url::from_file_path(&canonical)
            .map_err(|()| read_err(format!("{} is not an absolute path", canonical.display())))
    }

    async fn list_one_level(&self, prefix: &str) -> Result<Listing, StoreError> {
        let list_err = |message: String| StoreError::List {
            prefix: prefix.to_string(),
            message,
        };

        let dir = self
            .prefix_dir(prefix)
            .ok_or_else(|| list_err(invalid_key(prefix)))?;

        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Listing::default()),
            Err(e) => return Err(list_err(e.to_string())),
        };

        let mut listing = Listing::default();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| list_err(e.to_string()))?
        {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(dir = %dir.display(), name = ?raw, "skipping non-UTF-8 entry");
                    continue;
                }
            };
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(_) => continue,
            };

            let (seg, is_prefix) = if file_type.is_dir() {
                match name.strip_suffix(PREFIX_SUFFIX) {
                    Some(seg) => (seg, true),
                    None => continue,
                }
            } else if file_type.is_file() {
                match name.strip_suffix(OBJECT_SUFFIX) {
                    Some(seg) => (seg, false),
                    None => continue,
                }
            } else {
                continue;
            };
            if !valid_segment(seg) {
                continue;
            }

            let key = if prefix.is_empty() {
                seg.to_string()
            } else {
                format!("{prefix}{DELIMITER}{seg}")
            };
            if is_prefix {
                listing.prefixes.insert(key);
            } else {
                listing.objects.insert(key);
            }
        }
        Ok(listing)
    }
}
