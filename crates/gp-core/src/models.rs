//! # Domain Models
//!
//! These structs represent the core entities of GeoPost.
//! Posts carry no identity key; their position in the store is the only handle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Displayed in place of a post address that was never provided.
pub const ADDRESS_PLACEHOLDER: &str = "Not provided";

/// A device or platform service that needs user authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Camera,
    MediaLibrary,
    Location,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Camera => "camera",
            Capability::MediaLibrary => "media library",
            Capability::Location => "location",
        };
        f.write_str(name)
    }
}

/// Authorization state of a single capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionState {
    #[default]
    Undetermined,
    Denied,
    Granted,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

/// Which lens the live preview uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Front,
    #[default]
    Back,
}

impl Facing {
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

/// A resolved geolocation reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            captured_at: Utc::now(),
        }
    }

    /// True when the fix was taken no longer than `max_age` before `now`.
    pub fn is_fresh(&self, max_age: chrono::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.captured_at) <= max_age
    }
}

/// Handle to a device-local image produced by the camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPhoto {
    /// Opaque resource URI (e.g. `file:///.../capture.jpg`)
    pub uri: String,
}

impl CapturedPhoto {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            posted_at: Utc::now(),
        }
    }
}

/// A published photo with its caption, optional location and comment thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub picture: CapturedPhoto,
    pub name: String,
    pub location: Option<LocationFix>,
    pub address: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn new(
        picture: CapturedPhoto,
        name: impl Into<String>,
        location: Option<LocationFix>,
        address: Option<String>,
    ) -> Self {
        Self {
            picture,
            name: name.into(),
            location,
            address,
            comments: Vec::new(),
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// The address to show in lists, falling back to [`ADDRESS_PLACEHOLDER`].
    pub fn display_address(&self) -> &str {
        self.address.as_deref().unwrap_or(ADDRESS_PLACEHOLDER)
    }
}
