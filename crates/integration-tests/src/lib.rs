//! Shared fixtures for the cross-crate scenario tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gp_core::models::Capability;
use gp_core::{CaptureSession, LocationResolver, Notices, PermissionGate, PostStore};
use gp_platform_sim::{SimCamera, SimLocator, SimPermissions, StackNavigator};
use gp_storage_local::{FileSnapshotStore, LocalMediaLibrary};

/// Everything one app launch wires together, rooted in `data_dir`.
pub struct App {
    pub notices: Notices,
    pub gate: Arc<PermissionGate>,
    pub capture: CaptureSession,
    pub store: Arc<PostStore>,
    pub navigator: Arc<StackNavigator>,
}

pub struct Answers {
    pub camera: bool,
    pub media_library: bool,
    pub location: bool,
}

impl Default for Answers {
    fn default() -> Self {
        Self {
            camera: true,
            media_library: true,
            location: true,
        }
    }
}

impl App {
    pub async fn launch(data_dir: &Path, answers: Answers, locator: SimLocator) -> Self {
        let notices = Notices::new(16);
        let permissions = SimPermissions::granting_all()
            .answer(Capability::Camera, answers.camera)
            .answer(Capability::MediaLibrary, answers.media_library)
            .answer(Capability::Location, answers.location);
        let gate = Arc::new(PermissionGate::new(Arc::new(permissions)));
        let resolver = Arc::new(LocationResolver::new(
            Arc::clone(&gate),
            Arc::new(locator),
            notices.clone(),
            Duration::from_millis(200),
        ));
        let capture = CaptureSession::new(
            Arc::clone(&gate),
            Arc::new(SimCamera::new(data_dir.join("captures"))),
            Arc::new(LocalMediaLibrary::new(data_dir.join("media"))),
            resolver,
            notices.clone(),
            chrono::Duration::minutes(2),
        );
        let store = Arc::new(
            PostStore::rehydrate(
                Arc::new(FileSnapshotStore::new(data_dir.join("posts.json"))),
                notices.clone(),
            )
            .await,
        );
        Self {
            notices,
            gate,
            capture,
            store,
            navigator: Arc::new(StackNavigator::starting_at(gp_core::Screen::Camera)),
        }
    }

    /// Prompts for camera and media library the way the blocked view's button does.
    pub async fn grant_capture_permissions(&self) {
        self.gate.request(Capability::Camera).await;
        self.gate.request(Capability::MediaLibrary).await;
    }
}
