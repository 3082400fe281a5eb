//! Event system for communication between a frontend and the core.
//!
//! The frontend translates user input into [`Command`]s, which a
//! [`Session`](crate::session::Session) processes and answers with
//! [`Event`]s. Any frontend can drive the same core logic this way.

use url::Url;

use crate::listing::NamespaceSnapshot;
use crate::path::NsPath;

/// An action the frontend requests the core to perform.
///
/// Commands flow **frontend → core**. Names are relative to the current path.
#[derive(Debug, Clone)]
pub enum Command {
    /// Navigate into the child folder with the given name.
    EnterFolder(String),
    /// Move to the parent folder.
    GoBack,
    /// Re-list the current folder.
    Refresh,
    /// Create a child folder.
    CreateFolder(String),
    /// Delete a child folder and everything in it.
    DeleteFolder(String),
    /// Store a file in the current folder.
    Upload { name: String, bytes: Vec<u8> },
    /// Delete a file from the current folder.
    DeleteFile(String),
    /// Ask for a link to open a file.
    PreviewFile(String),
    /// Ask for a link to share a file.
    ShareFile(String),
}

/// What a download link was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPurpose {
    Preview,
    Share,
}

/// A notification the core sends back to the frontend.
///
/// Events flow **core → frontend**. The frontend uses these to update its
/// display state; [`Event::status_message`] gives the text for a status line.
#[derive(Debug, Clone)]
pub enum Event {
    /// A folder has been listed.
    DirectoryLoaded {
        /// The folder that was listed.
        path: NsPath,
        /// Its visible children.
        snapshot: NamespaceSnapshot,
    },
    /// Listing a folder failed; its contents are unknown.
    ListingFailed {
        /// The folder that could not be listed.
        path: NsPath,
        /// The error message.
        error: String,
    },
    /// An operation completed successfully.
    OperationComplete {
        /// Human-readable description of the outcome.
        operation: String,
    },
    /// An operation failed.
    OperationFailed {
        /// Human-readable description of the operation.
        operation: String,
        /// The error message.
        error: String,
    },
    /// A download link is ready to be opened or handed out.
    LinkReady {
        /// The file the link points to.
        name: String,
        url: Url,
        purpose: LinkPurpose,
    },
}

impl Event {
    /// Returns the text to show in a status line, if this event has one.
    pub fn status_message(&self) -> Option<String> {
        match self {
            Self::DirectoryLoaded { .. } => None,
            Self::ListingFailed { error, .. } => Some(format!("Error listing files: {error}")),
            Self::OperationComplete { operation } => Some(operation.clone()),
            Self::OperationFailed { operation, error } => Some(format!("{operation}: {error}")),
            Self::LinkReady {
                name,
                purpose: LinkPurpose::Preview,
                ..
            } => Some(format!("Preview link for \"{name}\" ready.")),
            Self::LinkReady {
                name,
                purpose: LinkPurpose::Share,
                ..
            } => Some(format!("Share link for \"{name}\" ready.")),
        }
    }

    /// Returns `true` for [`Event::OperationFailed`] and [`Event::ListingFailed`].
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::OperationFailed { .. } | Self::ListingFailed { .. }
        )
    }
}
