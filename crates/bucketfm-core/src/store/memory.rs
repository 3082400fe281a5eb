//! In-memory object store.
//!
//! Keeps every object in an ordered map behind a `tokio` lock. Failures can
//! be injected per key or prefix with [`InMemoryStore::inject`], which makes
//! this backend the fixture of choice for exercising error paths.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use url::Url;

use super::{Listing, ObjectStore};
use crate::error::StoreError;
use crate::path::DELIMITER;

const DEFAULT_BASE_URL: &str = "memory://bucket/";

/// A store call that should fail for one specific key or prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `put` of this key fails with [`StoreError::Write`].
    Put(String),
    /// `delete` of this key fails with [`StoreError::Delete`].
    Delete(String),
    /// `download_url` of this key fails with [`StoreError::Read`].
    Url(String),
    /// `list_one_level` of this prefix fails with [`StoreError::List`].
    List(String),
}

/// Object store held entirely in memory.
#[derive(Debug)]
pub struct InMemoryStore {
    base_url: Url,
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    faults: RwLock<HashSet<Fault>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store whose download URLs start with `memory://bucket/`.
    pub fn new() -> Self {
        Self::with_base_url(Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"))
    }

    /// Creates an empty store whose download URLs start with `base_url`.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            objects: RwLock::new(BTreeMap::new()),
            faults: RwLock::new(HashSet::new()),
        }
    }

    /// Makes a future store call fail until [`InMemoryStore::clear_faults`].
    pub async fn inject(&self, fault: Fault) {
        self.faults.write().await.insert(fault);
    }

    /// Removes every injected fault.
    pub async fn clear_faults(&self) {
        self.faults.write().await.clear();
    }

    /// Returns the contents of the object at `key`, if present.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }

    /// Returns `true` if an object exists at `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// Returns every stored key in order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    async fn has_fault(&self, fault: &Fault) -> bool {
        self.faults.read().await.contains(fault)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        if self.has_fault(&Fault::Put(key.to_string())).await {
            return Err(StoreError::Write {
                key: key.to_string(),
                message: "injected write failure".to_string(),
            });
        }
        self.objects
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.has_fault(&Fault::Delete(key.to_string())).await {
            return Err(StoreError::Delete {
                key: key.to_string(),
                message: "injected delete failure".to_string(),
            });
        }
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
        }
    }

    async fn download_url(&self, key: &str) -> Result<Url, StoreError> {
        if self.has_fault(&Fault::Url(key.to_string())).await {
            return Err(StoreError::Read {
                key: key.to_string(),
                message: "injected read failure".to_string(),
            });
        }
        if !self.contains(key).await {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Read {
                key: key.to_string(),
                message: format!("base URL {} cannot hold a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(key.split(DELIMITER));
        Ok(url)
    }

    async fn list_one_level(&self, prefix: &str) -> Result<Listing, StoreError> {
        if self.has_fault(&Fault::List(prefix.to_string())).await {
            return Err(StoreError::List {
                prefix: prefix.to_string(),
                message: "injected listing failure".to_string(),
            });
        }

        let scope = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}{DELIMITER}")
        };

        let objects = self.objects.read().await;
        let mut listing = Listing::default();
        for key in objects.keys().filter(|k| k.starts_with(&scope)) {
            let rest = &key[scope.len()..];
            match rest.find(DELIMITER) {
                Some(idx) => {
                    listing.prefixes.insert(format!("{scope}{}", &rest[..idx]));
                }
                None => {
                    listing.objects.insert(key.clone());
                }
            }
        }
        Ok(listing)
    }
}
