//! Error types for `bucketfm-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`. Failures reported by an
//! [`ObjectStore`](crate::store::ObjectStore) backend are [`StoreError`]s and
//! are always wrapped, never swallowed.

use std::fmt;
use std::path::PathBuf;

use crate::path::NsPath;

/// Error reported by an object store backend.
///
/// Every variant carries the key (or listing prefix) it concerns plus a
/// backend-specific message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Writing an object failed.
    #[error("store write failed for {key}: {message}")]
    Write { key: String, message: String },

    /// Deleting an object failed.
    #[error("store delete failed for {key}: {message}")]
    Delete { key: String, message: String },

    /// The object does not exist.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// Reading an object (or producing its download URL) failed.
    #[error("store read failed for {key}: {message}")]
    Read { key: String, message: String },

    /// A one-level listing failed.
    #[error("store listing failed for \"{prefix}\": {message}")]
    List { prefix: String, message: String },
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A single key that a subtree delete failed to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    /// The object key (or, for a failed nested listing, the prefix).
    pub key: String,
    /// The underlying store failure.
    pub error: StoreError,
}

impl fmt::Display for DeleteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.error)
    }
}

/// Unified error type for all core operations.
///
/// Validation variants are raised before any store call is made; the
/// store-backed variants carry the path or key plus the wrapped cause.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A folder name is empty or whitespace-only.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// A path segment is empty, reserved, or contains the delimiter.
    #[error("invalid path segment: {0:?}")]
    InvalidSegment(String),

    /// The resulting path would be nested deeper than allowed.
    #[error("maximum {max} nested folder levels allowed: /{path}")]
    DepthExceeded { path: NsPath, max: usize },

    /// The root path has no parent.
    #[error("the root path has no parent")]
    NoParent,

    /// Listing a path failed; its contents are unknown (not empty).
    #[error("listing /{path} failed: {source}")]
    ListingFailed {
        path: NsPath,
        #[source]
        source: StoreError,
    },

    /// Writing a folder's sentinel marker failed.
    #[error("creating folder /{path} failed: {source}")]
    FolderCreateFailed {
        path: NsPath,
        #[source]
        source: StoreError,
    },

    /// Uploading a file failed.
    #[error("upload of {key} failed: {source}")]
    UploadFailed {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Deleting a single file failed.
    #[error("delete of {key} failed: {source}")]
    DeleteFailed {
        key: String,
        #[source]
        source: StoreError,
    },

    /// No download URL could be produced for the object.
    #[error("no download URL for {key}: {source}")]
    UrlUnavailable {
        key: String,
        #[source]
        source: StoreError,
    },

    /// Some objects of a recursive delete could not be removed.
    ///
    /// Objects that were deleted stay deleted.
    #[error("{} object(s) under /{path} could not be deleted", .failures.len())]
    SubtreeDeletePartialFailure {
        path: NsPath,
        failures: Vec<DeleteFailure>,
    },

    /// A configuration file does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to read a configuration file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Returns `true` if the wrapped store cause is [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ListingFailed { source, .. }
            | Self::FolderCreateFailed { source, .. }
            | Self::UploadFailed { source, .. }
            | Self::DeleteFailed { source, .. }
            | Self::UrlUnavailable { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Returns the keys a partial subtree delete failed to remove.
    ///
    /// Empty for every other variant.
    pub fn failed_keys(&self) -> Vec<&str> {
        match self {
            Self::SubtreeDeletePartialFailure { failures, .. } => {
                failures.iter().map(|f| f.key.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Convenience alias used throughout `bucketfm-core`.
pub type CoreResult<T> = Result<T, CoreError>;
