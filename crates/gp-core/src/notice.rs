//! # Notices
//!
//! Typed, non-fatal messages for the UI layer. Components publish here
//! instead of raising alerts; any number of screens may subscribe.

use std::fmt;

use tokio::sync::broadcast;

use crate::models::Capability;

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    PhotoSaved,
    MediaSaveFailed(String),
    CaptureFailed(String),
    PermissionRequired(Capability),
    LocationUnavailable(String),
    PersistenceFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PhotoSaved => f.write_str("Photo saved to library!"),
            Notice::MediaSaveFailed(reason) => {
                write!(f, "Could not save photo to library: {reason}")
            }
            Notice::CaptureFailed(reason) => write!(f, "Error taking photo: {reason}"),
            Notice::PermissionRequired(capability) => {
                write!(f, "Permission to access the {capability} is required")
            }
            Notice::LocationUnavailable(reason) => f.write_str(reason),
            Notice::PersistenceFailed(reason) => write!(f, "Posts could not be saved: {reason}"),
        }
    }
}

/// Cloneable publisher handle for the notice channel.
#[derive(Debug, Clone)]
pub struct Notices {
    tx: broadcast::Sender<Notice>,
}

impl Notices {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Delivers to current subscribers; a channel nobody listens to drops the notice.
    pub fn publish(&self, notice: Notice) {
        tracing::debug!(%notice, "notice published");
        let _ = self.tx.send(notice);
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new(32)
    }
}
