//! BucketFM core library — folder semantics over flat object stores.
//!
//! `bucketfm-core` presents a folder/file hierarchy on top of a key-value
//! blob store that only knows flat keys and prefix listings. Folders are
//! derived state: a folder exists while some object lives under its prefix,
//! and an empty folder is kept observable by a zero-byte `.keep` sentinel.
//! The library is UI-agnostic; a frontend drives it through [`Session`].
//!
//! # Modules
//!
//! - [`path`] — [`NsPath`], object keys, sentinel naming, and the depth limit.
//! - [`store`] — the [`ObjectStore`] capability plus in-memory and local-directory backends.
//! - [`listing`] — [`NamespaceLister`] and [`NamespaceSnapshot`]: child folders and files of a path.
//! - [`folder`] — [`FolderOps`]: folder creation and concurrent recursive deletion.
//! - [`file`] — [`FileOps`]: upload, delete, and download links.
//! - [`nav`] — [`NavigationState`]: current path with a depth guard.
//! - [`session`] — [`Session`]: command dispatch with refresh-after-mutation.
//! - [`config`] — TOML-based settings ([`Config`]).
//! - [`event`] — [`Command`] and [`Event`] types for frontend ↔ core communication.
//! - [`error`] — Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod event;
pub mod file;
pub mod folder;
pub mod listing;
pub mod nav;
pub mod path;
pub mod session;
pub mod store;

pub use config::{Config, StoreBackend};
pub use error::{CoreError, CoreResult, DeleteFailure, StoreError};
pub use event::{Command, Event, LinkPurpose};
pub use file::FileOps;
pub use folder::{DeleteReport, FolderOps};
pub use listing::{Entry, EntryKind, NamespaceLister, NamespaceSnapshot};
pub use nav::NavigationState;
pub use path::{leaf_name, object_key, sentinel_key, NsPath, DELIMITER, MAX_DEPTH, SENTINEL_NAME};
pub use session::Session;
pub use store::{Fault, InMemoryStore, Listing, LocalStore, ObjectStore};
