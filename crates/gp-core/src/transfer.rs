//! # Post Transfer Channel
//!
//! Typed one-shot payloads handed between screens through the [`Navigator`].
//! Receivers treat every payload as optional: a screen may be reached by a
//! path that carries nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{CapturedPhoto, LocationFix, Post};
use crate::traits::Navigator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    Camera,
    CreatePost,
    Posts,
    Comments,
    Map,
}

/// Camera -> composition screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureHandoff {
    pub picture: CapturedPhoto,
    pub location: Option<LocationFix>,
}

/// Composition screen -> feed. Named replacement for the
/// `[picture, name, location, address]` tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPost {
    pub picture: CapturedPhoto,
    pub name: String,
    pub location: Option<LocationFix>,
    pub address: Option<String>,
}

impl ComposedPost {
    pub fn into_post(self) -> Post {
        Post::new(self.picture, self.name, self.location, self.address)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavPayload {
    Capture(CaptureHandoff),
    Composed(ComposedPost),
    /// A snapshot of the post; writes go back through the store by `index`.
    Comments { index: usize, post: Post },
    Map {
        index: usize,
        name: String,
        location: Option<LocationFix>,
    },
}

/// Model of the post-composition screen.
pub struct PostComposer {
    navigator: Arc<dyn Navigator>,
    handoff: Option<CaptureHandoff>,
}

impl PostComposer {
    /// Reads the capture handoff from the current screen, if there is one.
    pub fn from_navigation(navigator: Arc<dyn Navigator>) -> Self {
        let handoff = match navigator.current_payload() {
            Some(NavPayload::Capture(handoff)) => Some(handoff),
            other => {
                debug!(payload = ?other, "composition screen opened without a capture");
                None
            }
        };
        Self { navigator, handoff }
    }

    pub fn handoff(&self) -> Option<&CaptureHandoff> {
        self.handoff.as_ref()
    }

    pub fn can_publish(&self) -> bool {
        self.handoff.is_some()
    }

    /// Builds the post record and sends it to the feed.
    pub fn publish(&self, name: &str, address: Option<&str>) -> Result<ComposedPost> {
        let handoff = self
            .handoff
            .as_ref()
            .ok_or_else(|| AppError::ValidationError("no photo to publish".into()))?;

        let composed = ComposedPost {
            picture: handoff.picture.clone(),
            name: name.trim().to_string(),
            location: handoff.location,
            address: address
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        };
        info!(name = %composed.name, has_location = composed.location.is_some(), "publishing post");
        self.navigator
            .navigate(Screen::Posts, Some(NavPayload::Composed(composed.clone())));
        Ok(composed)
    }
}
