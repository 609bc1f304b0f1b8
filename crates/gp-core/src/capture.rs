//! # Capture Session
//!
//! State behind the camera screen: lens direction, the photo just taken,
//! and the shutter workflow that hands `{photo, location}` to composition.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::location::LocationResolver;
use crate::models::{Capability, CapturedPhoto, Facing};
use crate::notice::{Notice, Notices};
use crate::permission::{GateView, PermissionGate};
use crate::traits::{Camera, MediaLibrary, Navigator};
use crate::transfer::{CaptureHandoff, NavPayload, Screen};

/// Result of pressing the shutter, after errors were turned into notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterOutcome {
    Navigated,
    /// The screen went away while the capture was running.
    Discarded,
    Busy,
    Failed,
}

/// Clears the in-flight flag when the capture finishes or is dropped.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CaptureSession {
    gate: Arc<PermissionGate>,
    camera: Arc<dyn Camera>,
    library: Arc<dyn MediaLibrary>,
    resolver: Arc<LocationResolver>,
    notices: Notices,
    max_fix_age: chrono::Duration,
    facing: Mutex<Facing>,
    pending: Mutex<Option<CapturedPhoto>>,
    capturing: AtomicBool,
    mounted: AtomicBool,
    location_task: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureSession {
    pub fn new(
        gate: Arc<PermissionGate>,
        camera: Arc<dyn Camera>,
        library: Arc<dyn MediaLibrary>,
        resolver: Arc<LocationResolver>,
        notices: Notices,
        max_fix_age: chrono::Duration,
    ) -> Self {
        Self {
            gate,
            camera,
            library,
            resolver,
            notices,
            max_fix_age,
            facing: Mutex::new(Facing::default()),
            pending: Mutex::new(None),
            capturing: AtomicBool::new(false),
            mounted: AtomicBool::new(false),
            location_task: Mutex::new(None),
        }
    }

    /// Evaluates permissions and starts the mount-time location lookup.
    /// Must be called from within a tokio runtime.
    pub async fn mount(&self) -> GateView {
        self.mounted.store(true, Ordering::Release);
        let resolver = Arc::clone(&self.resolver);
        let task = tokio::spawn(async move {
            resolver.resolve().await;
        });
        if let Some(previous) = self.location_task.lock().replace(task) {
            previous.abort();
        }
        self.gate.capture_readiness().await
    }

    /// Marks the screen gone. Work still running is dropped without delivery.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
        if let Some(task) = self.location_task.lock().take() {
            task.abort();
        }
        debug!("capture screen unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn facing(&self) -> Facing {
        *self.facing.lock()
    }

    pub fn toggle_facing(&self) -> Facing {
        let mut facing = self.facing.lock();
        *facing = facing.toggled();
        *facing
    }

    pub fn pending_photo(&self) -> Option<CapturedPhoto> {
        self.pending.lock().clone()
    }

    /// The "Edit Photo" action.
    pub fn discard_pending(&self) {
        self.pending.lock().take();
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    /// Takes a photo, saves it to the gallery, and pairs it with a location.
    ///
    /// A gallery failure does not fail the capture; it is reported as
    /// [`Notice::MediaSaveFailed`] and the photo is still returned.
    pub async fn capture(&self) -> Result<CaptureHandoff> {
        self.gate.ensure(Capability::Camera)?;
        self.gate.ensure(Capability::MediaLibrary)?;
        let _flight = FlightGuard::acquire(&self.capturing).ok_or(AppError::Busy("capture"))?;

        let facing = self.facing();
        let picture = self
            .camera
            .capture_photo(facing)
            .await
            .map_err(|err| AppError::DeviceUnavailable(err.to_string()))?;
        if picture.uri.is_empty() {
            return Err(AppError::DeviceUnavailable("camera returned no image".into()));
        }
        info!(uri = %picture.uri, ?facing, "photo captured");

        match self.library.save(&picture).await {
            Ok(()) => self.notices.publish(Notice::PhotoSaved),
            Err(err) => {
                warn!(uri = %picture.uri, error = %err, "saving to media library failed");
                self.notices.publish(Notice::MediaSaveFailed(err.to_string()));
            }
        }

        let location = self.resolver.fix_for_capture(self.max_fix_age).await;
        *self.pending.lock() = Some(picture.clone());
        Ok(CaptureHandoff { picture, location })
    }

    /// Runs [`capture`](Self::capture) and hands the result to composition.
    pub async fn shutter(&self, navigator: &dyn Navigator) -> ShutterOutcome {
        match self.capture().await {
            Ok(handoff) if self.is_mounted() => {
                self.pending.lock().take();
                navigator.navigate(Screen::CreatePost, Some(NavPayload::Capture(handoff)));
                ShutterOutcome::Navigated
            }
            Ok(handoff) => {
                debug!(uri = %handoff.picture.uri, "discarding capture for unmounted screen");
                self.pending.lock().take();
                ShutterOutcome::Discarded
            }
            Err(AppError::Busy(_)) => {
                debug!("shutter ignored while a capture is in flight");
                ShutterOutcome::Busy
            }
            Err(_) if !self.is_mounted() => ShutterOutcome::Discarded,
            Err(AppError::PermissionDenied(capability)) => {
                self.notices.publish(Notice::PermissionRequired(capability));
                ShutterOutcome::Failed
            }
            Err(err) => {
                warn!(error = %err, "capture failed");
                self.notices.publish(Notice::CaptureFailed(err.to_string()));
                ShutterOutcome::Failed
            }
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(task) = self.location_task.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocationFix, PermissionState};
    use crate::traits::{
        MockCamera, MockLocator, MockMediaLibrary, MockNavigator, MockPermissionProvider,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    /// Camera that keeps the shutter open for a while.
    struct SlowCamera(Duration);

    #[async_trait]
    impl Camera for SlowCamera {
        async fn capture_photo(&self, _facing: Facing) -> anyhow::Result<CapturedPhoto> {
            tokio::time::sleep(self.0).await;
            Ok(CapturedPhoto::new("file:///captures/slow.jpg"))
        }
    }

    fn provider(location: PermissionState) -> MockPermissionProvider {
        let mut provider = MockPermissionProvider::new();
        provider.expect_check().returning(move |cap| {
            Ok(match cap {
                Capability::Location => location,
                _ => PermissionState::Granted,
            })
        });
        provider.expect_request().returning(move |cap| {
            Ok(match cap {
                Capability::Location => location,
                _ => PermissionState::Granted,
            })
        });
        provider
    }

    fn session(
        location: PermissionState,
        camera: impl Camera + 'static,
        library: MockMediaLibrary,
        locator: MockLocator,
    ) -> (CaptureSession, Notices) {
        let notices = Notices::new(8);
        let gate = Arc::new(PermissionGate::new(Arc::new(provider(location))));
        let resolver = Arc::new(LocationResolver::new(
            Arc::clone(&gate),
            Arc::new(locator),
            notices.clone(),
            Duration::from_millis(100),
        ));
        let session = CaptureSession::new(
            gate,
            Arc::new(camera),
            Arc::new(library),
            resolver,
            notices.clone(),
            chrono::Duration::minutes(2),
        );
        (session, notices)
    }

    fn camera_ok() -> MockCamera {
        let mut camera = MockCamera::new();
        camera
            .expect_capture_photo()
            .returning(|_| Ok(CapturedPhoto::new("file:///captures/1.jpg")));
        camera
    }

    fn library_ok() -> MockMediaLibrary {
        let mut library = MockMediaLibrary::new();
        library.expect_save().returning(|_| Ok(()));
        library
    }

    #[test]
    fn double_toggle_restores_facing() {
        let (session, _) = session(
            PermissionState::Granted,
            MockCamera::new(),
            MockMediaLibrary::new(),
            MockLocator::new(),
        );
        let original = session.facing();
        session.toggle_facing();
        session.toggle_facing();
        assert_eq!(session.facing(), original);
    }

    #[tokio::test]
    async fn capture_with_location_denied_has_no_location() {
        let mut locator = MockLocator::new();
        locator.expect_current_fix().never();
        let (session, _) = session(PermissionState::Denied, camera_ok(), library_ok(), locator);

        assert_eq!(session.mount().await, GateView::Ready);
        let handoff = session.capture().await.unwrap();
        assert_eq!(handoff.picture.uri, "file:///captures/1.jpg");
        assert_eq!(handoff.location, None);
    }

    #[tokio::test]
    async fn capture_refused_before_permissions_are_known() {
        let mut camera = MockCamera::new();
        camera.expect_capture_photo().never();
        let (session, _) = session(
            PermissionState::Granted,
            camera,
            MockMediaLibrary::new(),
            MockLocator::new(),
        );
        assert_eq!(
            session.capture().await,
            Err(AppError::PermissionDenied(Capability::Camera))
        );
    }

    #[tokio::test]
    async fn media_library_failure_keeps_the_photo() {
        let mut library = MockMediaLibrary::new();
        library
            .expect_save()
            .returning(|_| Err(anyhow::anyhow!("disk full")));
        let mut locator = MockLocator::new();
        locator
            .expect_current_fix()
            .returning(|| Ok(Some(LocationFix::new(48.0, 11.0))));
        let (session, notices) = session(PermissionState::Granted, camera_ok(), library, locator);
        let mut rx = notices.subscribe();

        session.mount().await;
        let handoff = session.capture().await.unwrap();
        assert_eq!(handoff.picture.uri, "file:///captures/1.jpg");
        assert!(handoff.location.is_some());

        let mut saw_failure = false;
        while let Ok(notice) = rx.try_recv() {
            saw_failure |= matches!(notice, Notice::MediaSaveFailed(_));
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn empty_uri_is_a_device_failure() {
        let mut camera = MockCamera::new();
        camera
            .expect_capture_photo()
            .returning(|_| Ok(CapturedPhoto::new("")));
        let mut library = MockMediaLibrary::new();
        library.expect_save().never();
        let (session, _) = session(PermissionState::Denied, camera, library, MockLocator::new());

        session.mount().await;
        assert!(matches!(
            session.capture().await,
            Err(AppError::DeviceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn shutter_navigates_and_releases_the_photo() {
        let (session, _) = session(
            PermissionState::Denied,
            camera_ok(),
            library_ok(),
            MockLocator::new(),
        );
        let mut nav = MockNavigator::new();
        nav.expect_navigate()
            .withf(|screen, payload| {
                *screen == Screen::CreatePost && matches!(payload, Some(NavPayload::Capture(_)))
            })
            .times(1)
            .return_const(());

        session.mount().await;
        assert_eq!(session.shutter(&nav).await, ShutterOutcome::Navigated);
        assert_eq!(session.pending_photo(), None);
    }

    #[tokio::test]
    async fn shutter_after_unmount_does_not_navigate() {
        let (session, _) = session(
            PermissionState::Denied,
            camera_ok(),
            library_ok(),
            MockLocator::new(),
        );
        let mut nav = MockNavigator::new();
        nav.expect_navigate().never();

        session.mount().await;
        session.unmount();
        assert_eq!(session.shutter(&nav).await, ShutterOutcome::Discarded);
    }

    #[tokio::test]
    async fn camera_error_becomes_notice() {
        let mut camera = MockCamera::new();
        camera
            .expect_capture_photo()
            .returning(|_| Err(anyhow::anyhow!("sensor busy")));
        let (session, notices) = session(
            PermissionState::Denied,
            camera,
            MockMediaLibrary::new(),
            MockLocator::new(),
        );
        let mut rx = notices.subscribe();
        let mut nav = MockNavigator::new();
        nav.expect_navigate().never();

        session.mount().await;
        assert_eq!(session.shutter(&nav).await, ShutterOutcome::Failed);
        let mut saw_capture_failure = false;
        while let Ok(notice) = rx.try_recv() {
            saw_capture_failure |= matches!(notice, Notice::CaptureFailed(_));
        }
        assert!(saw_capture_failure);
    }

    #[tokio::test]
    async fn second_capture_while_first_runs_is_busy() {
        let (session, _) = session(
            PermissionState::Denied,
            SlowCamera(Duration::from_millis(50)),
            library_ok(),
            MockLocator::new(),
        );
        session.mount().await;

        let (first, second) = tokio::join!(session.capture(), session.capture());
        assert_eq!(first.map(|h| h.picture.uri).as_deref(), Ok("file:///captures/slow.jpg"));
        assert_eq!(second, Err(AppError::Busy("capture")));

        // The flag is released once the first capture settles.
        assert!(session.capture().await.is_ok());
    }

    #[tokio::test]
    async fn shutter_during_capture_is_busy_without_notice() {
        let (session, notices) = session(
            PermissionState::Denied,
            SlowCamera(Duration::from_millis(50)),
            library_ok(),
            MockLocator::new(),
        );
        let mut nav = MockNavigator::new();
        nav.expect_navigate().never();
        session.mount().await;
        let mut rx = notices.subscribe();

        let (first, second) = tokio::join!(session.capture(), session.shutter(&nav));
        assert!(first.is_ok());
        assert_eq!(second, ShutterOutcome::Busy);

        while let Ok(notice) = rx.try_recv() {
            assert!(
                !matches!(notice, Notice::CaptureFailed(_) | Notice::PermissionRequired(_)),
                "unexpected notice {notice:?}"
            );
        }
    }

    #[tokio::test]
    async fn unmount_during_capture_discards_the_result() {
        let (session, _) = session(
            PermissionState::Denied,
            SlowCamera(Duration::from_millis(100)),
            library_ok(),
            MockLocator::new(),
        );
        let mut nav = MockNavigator::new();
        nav.expect_navigate().never();
        session.mount().await;

        let (outcome, ()) = tokio::join!(session.shutter(&nav), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.unmount();
        });
        assert_eq!(outcome, ShutterOutcome::Discarded);
        assert_eq!(session.pending_photo(), None);
    }

    #[tokio::test]
    async fn edit_photo_discards_the_pending_capture() {
        let (session, _) = session(
            PermissionState::Denied,
            camera_ok(),
            library_ok(),
            MockLocator::new(),
        );
        session.mount().await;

        session.capture().await.unwrap();
        assert_eq!(
            session.pending_photo(),
            Some(CapturedPhoto::new("file:///captures/1.jpg"))
        );

        session.discard_pending();
        assert_eq!(session.pending_photo(), None);
    }
}
