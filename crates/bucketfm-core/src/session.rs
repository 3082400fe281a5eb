//! A browsing session over one object store.
//!
//! [`Session`] ties navigation, listing and the folder/file operations
//! together. Its direct methods never refresh the listing on their own;
//! [`Session::dispatch`] is the controller that runs a command and then
//! performs the refresh explicitly, after failures as well as successes.

use std::sync::Arc;

use url::Url;

use crate::config::Config;
use crate::error::CoreResult;
use crate::event::{Command, Event, LinkPurpose};
use crate::file::FileOps;
use crate::folder::{DeleteReport, FolderOps};
use crate::listing::{NamespaceLister, NamespaceSnapshot};
use crate::nav::NavigationState;
use crate::path::NsPath;
use crate::store::{self, ObjectStore};

/// Navigation state plus the current listing for one user.
#[derive(Debug)]
pub struct Session {
    lister: NamespaceLister,
    folders: FolderOps,
    files: FileOps,
    nav: NavigationState,
    snapshot: NamespaceSnapshot,
    retain_on_error: bool,
}

impl Session {
    /// Creates a session at the root of `store`. The listing starts empty;
    /// call [`Session::refresh`] (or dispatch [`Command::Refresh`]) to load it.
    pub fn new(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        Self {
            lister: NamespaceLister::new(Arc::clone(&store)),
            folders: FolderOps::new(Arc::clone(&store))
                .with_max_concurrency(config.delete.max_concurrency),
            files: FileOps::new(store),
            nav: NavigationState::new(),
            snapshot: NamespaceSnapshot::default(),
            retain_on_error: config.listing.retain_on_error,
        }
    }

    /// Opens the store selected in `config` and creates a session on it.
    ///
    /// # Errors
    ///
    /// See [`store::open`].
    pub fn open(config: &Config) -> CoreResult<Self> {
        let store = store::open(&config.store)?;
        Ok(Self::new(store, config))
    }

    /// Returns the folder being browsed.
    pub fn current_path(&self) -> &NsPath {
        self.nav.current_path()
    }

    /// Returns the navigation state.
    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    /// Returns the most recent listing of the current folder.
    pub fn snapshot(&self) -> &NamespaceSnapshot {
        &self.snapshot
    }

    /// Re-lists the current folder.
    ///
    /// On failure the listing is cleared, or kept as it was when
    /// `listing.retain_on_error` is set, and the error is returned.
    ///
    /// # Errors
    ///
    /// - [`CoreError::ListingFailed`](crate::CoreError::ListingFailed) if the store listing fails.
    pub async fn refresh(&mut self) -> CoreResult<&NamespaceSnapshot> {
        match self.lister.list(self.nav.current_path()).await {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                Ok(&self.snapshot)
            }
            Err(e) => {
                if !self.retain_on_error {
                    self.snapshot = NamespaceSnapshot::default();
                }
                Err(e)
            }
        }
    }

    /// Moves into the child folder `name`. The listing is cleared until the
    /// next refresh.
    ///
    /// # Errors
    ///
    /// See [`NavigationState::enter`]; the session is unchanged on error.
    pub fn enter(&mut self, name: &str) -> CoreResult<()> {
        self.nav = self.nav.enter(name)?;
        self.snapshot = NamespaceSnapshot::default();
        Ok(())
    }

    /// Moves to the parent folder. Returns `false` (and does nothing) at the root.
    pub fn back(&mut self) -> bool {
        if !self.nav.can_go_back() {
            return false;
        }
        self.nav = self.nav.back();
        self.snapshot = NamespaceSnapshot::default();
        true
    }

    /// Creates the folder `name` in the current folder.
    ///
    /// # Errors
    ///
    /// See [`FolderOps::create_folder`].
    pub async fn create_folder(&self, name: &str) -> CoreResult<NsPath> {
        self.folders.create_folder(self.current_path(), name).await
    }

    /// Deletes the folder `name` in the current folder, recursively.
    ///
    /// # Errors
    ///
    /// See [`FolderOps::delete_folder`].
    pub async fn delete_folder(&self, name: &str) -> CoreResult<DeleteReport> {
        self.folders.delete_folder(self.current_path(), name).await
    }

    /// Uploads `bytes` as the file `name` in the current folder.
    ///
    /// # Errors
    ///
    /// See [`FileOps::upload`].
    pub async fn upload(&self, name: &str, bytes: &[u8]) -> CoreResult<String> {
        self.files.upload(self.current_path(), name, bytes).await
    }

    /// Deletes the file `name` from the current folder.
    ///
    /// # Errors
    ///
    /// See [`FileOps::delete_file`].
    pub async fn delete_file(&self, name: &str) -> CoreResult<()> {
        self.files.delete_file(self.current_path(), name).await
    }

    /// Returns a link to open the file `name` in the current folder.
    ///
    /// # Errors
    ///
    /// See [`FileOps::preview_url`].
    pub async fn preview_url(&self, name: &str) -> CoreResult<Url> {
        self.files.preview_url(self.current_path(), name).await
    }

    /// Returns a link to share the file `name` in the current folder.
    ///
    /// # Errors
    ///
    /// See [`FileOps::share_url`].
    pub async fn share_url(&self, name: &str) -> CoreResult<Url> {
        self.files.share_url(self.current_path(), name).await
    }

    /// Runs `command` and reports what happened.
    ///
    /// Mutating commands emit their outcome followed by a refresh of the
    /// current folder, whether the mutation succeeded or not. Successful
    /// navigation emits the listing of the new folder; a refused navigation
    /// emits only the failure. Link requests do not refresh.
    pub async fn dispatch(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        let refresh = match command {
            Command::Refresh => true,
            Command::EnterFolder(name) => match self.enter(&name) {
                Ok(()) => true,
                Err(e) => {
                    events.push(failed("Cannot navigate deeper", e));
                    false
                }
            },
            Command::GoBack => self.back(),
            Command::CreateFolder(name) => {
                events.push(match self.create_folder(&name).await {
                    Ok(path) => complete(format!(
                        "Folder \"{}\" created successfully.",
                        path.name().unwrap_or_default()
                    )),
                    Err(e) => failed("Error creating folder", e),
                });
                true
            }
            Command::DeleteFolder(name) => {
                events.push(match self.delete_folder(&name).await {
                    Ok(_) => complete(format!(
                        "Folder \"{name}\" and its contents deleted successfully."
                    )),
                    Err(e) => failed("Error deleting folder", e),
                });
                true
            }
            Command::Upload { name, bytes } => {
                events.push(match self.upload(&name, &bytes).await {
                    Ok(_) => complete(format!("File \"{name}\" uploaded successfully.")),
                    Err(e) => failed("Error uploading file", e),
                });
                true
            }
            Command::DeleteFile(name) => {
                events.push(match self.delete_file(&name).await {
                    Ok(()) => complete(format!("File \"{name}\" deleted successfully.")),
                    Err(e) => failed("Error deleting file", e),
                });
                true
            }
            Command::PreviewFile(name) => {
                events.push(match self.preview_url(&name).await {
                    Ok(url) => Event::LinkReady {
                        name,
                        url,
                        purpose: LinkPurpose::Preview,
                    },
                    Err(e) => failed("Error previewing file", e),
                });
                false
            }
            Command::ShareFile(name) => {
                events.push(match self.share_url(&name).await {
                    Ok(url) => Event::LinkReady {
                        name,
                        url,
                        purpose: LinkPurpose::Share,
                    },
                    Err(e) => failed("Failed to generate share link", e),
                });
                false
            }
        };

        if refresh {
            events.push(self.refresh_event().await);
        }
        events
    }

    async fn refresh_event(&mut self) -> Event {
        let path = self.current_path().clone();
        match self.refresh().await {
            Ok(snapshot) => Event::DirectoryLoaded {
                path,
                snapshot: snapshot.clone(),
            },
            Err(e) => Event::ListingFailed {
                path,
                error: e.to_string(),
            },
        }
    }
}

fn complete(operation: String) -> Event {
    Event::OperationComplete { operation }
}

fn failed(operation: &str, error: crate::CoreError) -> Event {
    Event::OperationFailed {
        operation: operation.to_string(),
        error: error.to_string(),
    }
}
