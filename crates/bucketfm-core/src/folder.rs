//! Folder creation and recursive deletion.
//!
//! A folder exists exactly while some object lives under its prefix; the
//! zero-byte sentinel written by [`FolderOps::create_folder`] is what makes
//! an empty folder observable. Deleting a folder therefore means deleting
//! every object under its prefix, which [`FolderOps::delete_subtree`] does
//! with a concurrent fan-out.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;

use crate::error::{CoreError, CoreResult, DeleteFailure, StoreError};
use crate::path::{ensure_depth, NsPath};
use crate::store::{Listing, ObjectStore};

/// Outcome of a fully successful subtree delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    /// The folder that was removed.
    pub path: NsPath,
    /// Number of objects deleted, sentinels included.
    pub deleted: usize,
}

/// A unit of work in the subtree delete worklist.
enum Job {
    List(String),
    Delete(String),
}

enum Outcome {
    Listed(String, Result<Listing, StoreError>),
    Deleted(String, Result<(), StoreError>),
}

/// Folder operations against an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct FolderOps {
    store: Arc<dyn ObjectStore>,
    max_concurrency: usize,
}

impl FolderOps {
    /// Creates folder operations with unbounded delete fan-out.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            max_concurrency: 0,
        }
    }

    /// Caps the number of store calls a subtree delete keeps in flight.
    ///
    /// `0` means unbounded. The cap never changes which objects get deleted.
    #[must_use]
    pub fn with_max_concurrency(self, max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            ..self
        }
    }

    /// Ensures the folder `name` exists below `parent`.
    ///
    /// `name` is trimmed of surrounding whitespace. Creating a folder that
    /// already exists succeeds and changes nothing visible.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidName`] if `name` is empty or whitespace-only.
    /// - [`CoreError::InvalidSegment`] if `name` is reserved or contains `/`.
    /// - [`CoreError::DepthExceeded`] if the folder would be nested too deep.
    /// - [`CoreError::FolderCreateFailed`] if the sentinel cannot be written.
    pub async fn create_folder(&self, parent: &NsPath, name: &str) -> CoreResult<NsPath> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidName(name.to_string()));
        }
        let path = parent.join(trimmed)?;
        ensure_depth(&path)?;

        let key = path.sentinel_key();
        self.store.put(&key, &[]).await.map_err(|source| {
            tracing::warn!(path = %path, error = %source, "folder creation failed");
            CoreError::FolderCreateFailed {
                path: path.clone(),
                source,
            }
        })?;

        tracing::info!(path = %path, "folder created");
        Ok(path)
    }

    /// Deletes the folder `name` below `parent` together with everything in it.
    ///
    /// # Errors
    ///
    /// See [`FolderOps::delete_subtree`]; additionally
    /// [`CoreError::InvalidSegment`] if `name` is not a valid segment.
    pub async fn delete_folder(&self, parent: &NsPath, name: &str) -> CoreResult<DeleteReport> {
        let path = parent.join(name)?;
        self.delete_subtree(&path).await
    }

    /// Deletes every object whose key lies under `path`.
    ///
    /// The subtree is expanded level by level: each listed prefix schedules
    /// one delete per direct object (its own sentinel included) and one
    /// expansion per child prefix. All scheduled calls run concurrently, up
    /// to the configured cap, and every one of them runs to completion even
    /// after a failure. Deletion is not transactional: objects removed before
    /// a failure stay removed. A missing object counts as deleted.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ListingFailed`] if `path` itself cannot be listed; nothing
    ///   was deleted in that case.
    /// - [`CoreError::SubtreeDeletePartialFailure`] naming every key that could
    ///   not be deleted (and every nested prefix that could not be listed).
    pub async fn delete_subtree(&self, path: &NsPath) -> CoreResult<DeleteReport> {
        let root_prefix = path.as_prefix();
        let limit = match self.max_concurrency {
            0 => usize::MAX,
            n => n,
        };

        let mut pending = VecDeque::from([Job::List(root_prefix.clone())]);
        let mut in_flight: FuturesUnordered<BoxFuture<'static, Outcome>> = FuturesUnordered::new();
        let mut failures = Vec::new();
        let mut deleted = 0usize;

        loop {
            while in_flight.len() < limit {
                match pending.pop_front() {
                    Some(job) => in_flight.push(self.run(job)),
                    None => break,
                }
            }

            let Some(outcome) = in_flight.next().await else {
                break;
            };

            match outcome {
                Outcome::Listed(_, Ok(listing)) => {
                    pending.extend(listing.objects.into_iter().map(Job::Delete));
                    pending.extend(listing.prefixes.into_iter().map(Job::List));
                }
                Outcome::Listed(prefix, Err(source)) if prefix == root_prefix => {
                    tracing::warn!(path = %path, error = %source, "subtree listing failed");
                    return Err(CoreError::ListingFailed {
                        path: path.clone(),
                        source,
                    });
                }
                Outcome::Listed(prefix, Err(error)) => {
                    tracing::warn!(prefix = %prefix, error = %error, "nested listing failed");
                    failures.push(DeleteFailure { key: prefix, error });
                }
                Outcome::Deleted(_, Ok(())) => deleted += 1,
                Outcome::Deleted(key, Err(error)) if error.is_not_found() => {
                    tracing::debug!(key = %key, "object already gone");
                    deleted += 1;
                }
                Outcome::Deleted(key, Err(error)) => {
                    tracing::warn!(key = %key, error = %error, "object delete failed");
                    failures.push(DeleteFailure { key, error });
                }
            }
        }

        if failures.is_empty() {
            tracing::info!(path = %path, deleted, "folder deleted");
            Ok(DeleteReport {
                path: path.clone(),
                deleted,
            })
        } else {
            failures.sort_by(|a, b| a.key.cmp(&b.key));
            Err(CoreError::SubtreeDeletePartialFailure {
                path: path.clone(),
                failures,
            })
        }
    }

    fn run(&self, job: Job) -> BoxFuture<'static, Outcome> {
        let store = Arc::clone(&self.store);
        match job {
            Job::List(prefix) => async move {
                let result = store.list_one_level(&prefix).await;
                Outcome::Listed(prefix, result)
            }
            .boxed(),
            Job::Delete(key) => async move {
                let result = store.delete(&key).await;
                Outcome::Deleted(key, result)
            }
            .boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use url::Url;

    use crate::listing::NamespaceLister;
    use crate::store::{Fault, InMemoryStore};

    async fn seeded(keys: &[&str]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for key in keys {
            store.put(key, b"data").await.unwrap();
        }
        store
    }

    fn p(s: &str) -> NsPath {
        NsPath::parse(s).unwrap()
    }

    #[tokio::test]
    async fn create_folder_writes_empty_sentinel() {
        let store = seeded(&[]).await;
        let ops = FolderOps::new(store.clone());

        let path = ops.create_folder(&NsPath::root(), "docs").await.unwrap();
        assert_eq!(path.to_string(), "docs");
        assert_eq!(store.get("docs/.keep").await.unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn create_folder_trims_name() {
        let store = seeded(&[]).await;
        let ops = FolderOps::new(store.clone());

        let path = ops.create_folder(&p("a"), "  b  ").await.unwrap();
        assert_eq!(path.to_string(), "a/b");
        assert!(store.contains("a/b/.keep").await);
    }

    #[tokio::test]
    async fn create_folder_rejects_blank_name() {
        let store = seeded(&[]).await;
        let ops = FolderOps::new(store.clone());

        for blank in ["", "   ", "\t\n"] {
            match ops.create_folder(&NsPath::root(), blank).await {
                Err(CoreError::InvalidName(given)) => assert_eq!(given, blank),
                other => panic!("expected InvalidName for {blank:?}, got {other:?}"),
            }
        }
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn create_folder_rejects_reserved_names() {
        let store = seeded(&[]).await;
        let ops = FolderOps::new(store.clone());

        for bad in [".keep", "a/b", ".."] {
            assert!(matches!(
                ops.create_folder(&NsPath::root(), bad).await,
                Err(CoreError::InvalidSegment(_))
            ));
        }
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn create_folder_depth_limit() {
        let store = seeded(&[]).await;
        let ops = FolderOps::new(store.clone());

        ops.create_folder(&p("a/b/c/d/e"), "f").await.unwrap();
        assert!(store.contains("a/b/c/d/e/f/.keep").await);

        let err = ops.create_folder(&p("a/b/c/d/e/f"), "g").await.unwrap_err();
        assert!(matches!(err, CoreError::DepthExceeded { max: 6, .. }));
        assert!(!store.contains("a/b/c/d/e/f/g/.keep").await);
    }

    #[tokio::test]
    async fn create_folder_is_idempotent() {
        let store = seeded(&[]).await;
        let ops = FolderOps::new(store.clone());
        let lister = NamespaceLister::new(store.clone());

        ops.create_folder(&NsPath::root(), "a").await.unwrap();
        let once = lister.list(&NsPath::root()).await.unwrap();
        ops.create_folder(&NsPath::root(), "a").await.unwrap();
        let twice = lister.list(&NsPath::root()).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(store.keys().await, vec!["a/.keep"]);
    }

    #[tokio::test]
    async fn create_folder_store_failure() {
        let store = seeded(&[]).await;
        store.inject(Fault::Put("a/.keep".to_string())).await;
        let ops = FolderOps::new(store.clone());

        let err = ops.create_folder(&NsPath::root(), "a").await.unwrap_err();
        assert!(matches!(err, CoreError::FolderCreateFailed { .. }));
    }

    #[tokio::test]
    async fn delete_folder_removes_whole_subtree() {
        let store = seeded(&[
            "a/.keep",
            "a/b/.keep",
            "a/b/y.txt",
            "a/b/c/.keep",
            "a/x.txt",
            "keep-me.txt",
            "ab/.keep",
        ])
        .await;
        let ops = FolderOps::new(store.clone());
        let lister = NamespaceLister::new(store.clone());

        let report = ops.delete_folder(&NsPath::root(), "a").await.unwrap();
        assert_eq!(report.deleted, 5);
        assert_eq!(report.path.to_string(), "a");

        assert_eq!(store.keys().await, vec!["ab/.keep", "keep-me.txt"]);
        assert!(lister.list(&p("a")).await.unwrap().is_empty());
        assert!(!lister.list(&NsPath::root()).await.unwrap().has_folder("a"));
    }

    #[tokio::test]
    async fn delete_subtree_of_missing_folder_is_noop() {
        let store = seeded(&["other/.keep"]).await;
        let ops = FolderOps::new(store.clone());

        let report = ops.delete_subtree(&p("ghost")).await.unwrap();
        assert_eq!(report.deleted, 0);
        assert_eq!(store.keys().await, vec!["other/.keep"]);
    }

    #[tokio::test]
    async fn partial_failure_names_exact_keys_without_rollback() {
        let store = seeded(&["a/.keep", "a/1.txt", "a/2.txt", "a/3.txt", "a/b/.keep"]).await;
        store.inject(Fault::Delete("a/2.txt".to_string())).await;
        let ops = FolderOps::new(store.clone());

        let err = ops.delete_subtree(&p("a")).await.unwrap_err();
        assert_eq!(err.failed_keys(), vec!["a/2.txt"]);
        match &err {
            CoreError::SubtreeDeletePartialFailure { path, failures } => {
                assert_eq!(path.to_string(), "a");
                assert!(matches!(failures[0].error, StoreError::Delete { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(store.keys().await, vec!["a/2.txt"]);
    }

    #[tokio::test]
    async fn partial_failure_collects_every_failed_key() {
        let store = seeded(&["a/.keep", "a/x.txt", "a/b/.keep", "a/b/y.txt"]).await;
        store.inject(Fault::Delete("a/x.txt".to_string())).await;
        store.inject(Fault::Delete("a/b/y.txt".to_string())).await;
        let ops = FolderOps::new(store.clone());

        let err = ops.delete_subtree(&p("a")).await.unwrap_err();
        assert_eq!(err.failed_keys(), vec!["a/b/y.txt", "a/x.txt"]);
        assert_eq!(store.keys().await, vec!["a/b/y.txt", "a/x.txt"]);
    }

    #[tokio::test]
    async fn nested_listing_failure_is_reported_as_prefix() {
        let store = seeded(&["a/.keep", "a/b/.keep", "a/b/y.txt", "a/c/.keep"]).await;
        store.inject(Fault::List("a/b".to_string())).await;
        let ops = FolderOps::new(store.clone());

        let err = ops.delete_subtree(&p("a")).await.unwrap_err();
        assert_eq!(err.failed_keys(), vec!["a/b"]);
        assert_eq!(store.keys().await, vec!["a/b/.keep", "a/b/y.txt"]);
    }

    #[tokio::test]
    async fn root_listing_failure_deletes_nothing() {
        let store = seeded(&["a/.keep", "a/x.txt"]).await;
        store.inject(Fault::List("a".to_string())).await;
        let ops = FolderOps::new(store.clone());

        let err = ops.delete_subtree(&p("a")).await.unwrap_err();
        assert!(matches!(err, CoreError::ListingFailed { .. }));
        assert_eq!(store.keys().await.len(), 2);
    }

    #[tokio::test]
    async fn delete_folder_rejects_invalid_name() {
        let store = seeded(&["a/.keep"]).await;
        let ops = FolderOps::new(store.clone());

        assert!(matches!(
            ops.delete_folder(&NsPath::root(), "").await,
            Err(CoreError::InvalidSegment(_))
        ));
        assert!(store.contains("a/.keep").await);
    }

    /// Wraps a store and records how many deletes were in flight at once.
    #[derive(Debug)]
    struct CountingStore {
        inner: InMemoryStore,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: InMemoryStore::new(),
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
            self.inner.put(key, bytes).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let result = self.inner.delete(key).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn download_url(&self, key: &str) -> Result<Url, StoreError> {
            self.inner.download_url(key).await
        }

        async fn list_one_level(&self, prefix: &str) -> Result<Listing, StoreError> {
            self.inner.list_one_level(prefix).await
        }
    }

    async fn counting_store(files: usize) -> Arc<CountingStore> {
        let store = Arc::new(CountingStore::new());
        store.put("a/.keep", b"").await.unwrap();
        for i in 0..files {
            store.put(&format!("a/{i}.txt"), b"").await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn unbounded_fan_out_runs_deletes_concurrently() {
        let store = counting_store(8).await;
        let ops = FolderOps::new(store.clone());

        let report = ops.delete_subtree(&p("a")).await.unwrap();
        assert_eq!(report.deleted, 9);
        assert!(store.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn fan_out_respects_concurrency_cap() {
        let store = counting_store(8).await;
        let ops = FolderOps::new(store.clone()).with_max_concurrency(2);

        let report = ops.delete_subtree(&p("a")).await.unwrap();
        assert_eq!(report.deleted, 9);
        assert!(store.peak.load(Ordering::SeqCst) <= 2);
        assert!(store.inner.keys().await.is_empty());
    }
}
