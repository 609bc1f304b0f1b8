//! # Core Traits (Ports)
//!
//! Any platform plugin must implement these traits to be used by the binary.
//! Ports speak `anyhow::Result`; the components that call them translate
//! failures into [`crate::AppError`] or notices.

use async_trait::async_trait;

use crate::models::{Capability, CapturedPhoto, Facing, LocationFix, PermissionState};
use crate::transfer::{NavPayload, Screen};

/// Platform authorization prompts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Reads the current state without prompting the user.
    async fn check(&self, capability: Capability) -> anyhow::Result<PermissionState>;
    /// Prompts the user. The platform may suppress repeat prompts and answer directly.
    async fn request(&self, capability: Capability) -> anyhow::Result<PermissionState>;
}

/// Device camera contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Camera: Send + Sync {
    async fn capture_photo(&self, facing: Facing) -> anyhow::Result<CapturedPhoto>;
}

/// Device positioning contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Locator: Send + Sync {
    /// Returns `None` when the device has no signal.
    async fn current_fix(&self) -> anyhow::Result<Option<LocationFix>>;
}

/// Device photo gallery.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn save(&self, photo: &CapturedPhoto) -> anyhow::Result<()>;
}

/// Durable storage for the serialized post store.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns `None` if nothing was ever saved.
    async fn load(&self) -> anyhow::Result<Option<Vec<u8>>>;
    /// Replaces the stored snapshot. Implementations must never leave a partial write visible.
    async fn save(&self, snapshot: &[u8]) -> anyhow::Result<()>;
}

/// Screen-stack router, treated as a black box.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, screen: Screen, payload: Option<NavPayload>);
    fn current_screen(&self) -> Option<Screen>;
    /// Peeks at the payload of the current screen.
    fn current_payload(&self) -> Option<NavPayload>;
    /// Removes and returns the payload of the current screen so it is delivered once.
    fn take_payload(&self) -> Option<NavPayload>;
}
