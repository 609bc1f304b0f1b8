//! # GeoPost Binary
//!
//! Assembles the core with the compiled-in plugins and drives one headless
//! session: capture a photo, publish it, and walk the feed.

use std::sync::Arc;

use anyhow::Context;
use gp_config::AppConfig;
use gp_core::{
    Capability, CaptureSession, CommentsScreen, FeedRenderer, FeedView, GateView,
    LocationResolver, MapView, Navigator, Notices, PermissionGate, PostComposer, PostStore,
    Screen, ShutterOutcome,
};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "platform-sim")]
use gp_platform_sim::{SimCamera, SimLocator, SimPermissions, StackNavigator};

#[cfg(feature = "storage-local")]
use gp_storage_local::{FileSnapshotStore, LocalMediaLibrary};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config);

    // 1. Initialize Platform Implementation
    #[cfg(feature = "platform-sim")]
    let (permissions, camera, locator, navigator) = {
        let sim = &config.simulator;
        let permissions = SimPermissions::granting_all()
            .answer(Capability::Camera, sim.grant_camera)
            .answer(Capability::MediaLibrary, sim.grant_media_library)
            .answer(Capability::Location, sim.grant_location);
        let locator = if sim.signal {
            SimLocator::at(sim.fix.latitude, sim.fix.longitude)
        } else {
            SimLocator::no_signal()
        };
        (
            Arc::new(permissions),
            Arc::new(SimCamera::new(config.capture_path())),
            Arc::new(locator),
            Arc::new(StackNavigator::starting_at(Screen::Camera)),
        )
    };

    // 2. Initialize Storage Implementation
    #[cfg(feature = "storage-local")]
    let (snapshots, library) = {
        let snapshots = FileSnapshotStore::new(config.snapshot_path());
        tracing::debug!(snapshot = %snapshots.path().display(), "using local storage");
        (
            Arc::new(snapshots),
            Arc::new(LocalMediaLibrary::new(config.media_path())),
        )
    };

    // 3. Core services, constructed once and injected into every screen
    let notices = Notices::new(config.notice_capacity);
    spawn_notice_logger(&notices);

    let store = Arc::new(PostStore::rehydrate(snapshots, notices.clone()).await);
    let gate = Arc::new(PermissionGate::new(permissions));
    let resolver = Arc::new(LocationResolver::new(
        Arc::clone(&gate),
        locator,
        notices.clone(),
        config.location.timeout(),
    ));
    let capture = CaptureSession::new(
        Arc::clone(&gate),
        camera,
        library,
        resolver,
        notices.clone(),
        config.location.max_fix_age(),
    );

    tracing::info!(posts = store.len(), "🚀 GeoPost session starting");

    // 4. Camera screen: grant what is missing, then shoot
    let mut view = capture.mount().await;
    while let GateView::Blocked { capability, message } = view {
        tracing::info!(%capability, reason = message, "requesting permission");
        if !gate.request(capability).await.is_granted() {
            tracing::warn!(%capability, "permission refused; nothing to capture");
            capture.unmount();
            return Ok(());
        }
        view = gate.capture_readiness().await;
    }

    let outcome = capture.shutter(navigator.as_ref()).await;
    tracing::info!(?outcome, location = %capture.resolver().status_text(), "shutter released");
    capture.unmount();
    if outcome != ShutterOutcome::Navigated {
        return Ok(());
    }

    // 5. Composition screen
    let composer = PostComposer::from_navigation(navigator.clone());
    if let Some(handoff) = composer.handoff() {
        tracing::debug!(
            uri = %handoff.picture.uri,
            located = handoff.location.is_some(),
            "composing post"
        );
    }
    composer.publish(&config.session.post_name, config.session.address.as_deref())?;

    // 6. Feed
    let feed = FeedRenderer::new(Arc::clone(&store), navigator.clone());
    let selection = feed.receive().await;
    match feed.render() {
        FeedView::Empty { message } => tracing::info!("{message}"),
        FeedView::Posts(items) => {
            for item in items {
                tracing::info!(
                    index = item.index,
                    name = %item.name,
                    address = %item.address,
                    comments = item.comment_count,
                    "feed item"
                );
            }
        }
    }

    // 7. Comments and map for the post just published
    if let Some(text) = config.session.comment_text.as_deref() {
        if feed.open_comments(selection) {
            let mut comments =
                CommentsScreen::from_payload(Arc::clone(&store), navigator.take_payload())
                    .context("comments screen opened without a post")?;
            let count = comments.submit(&config.session.comment_author, text).await?;
            tracing::info!(post = %comments.post().name, count, "comment added");
            navigator.back();
        }
    }

    if feed.view_location(selection) {
        match MapView::from_payload(navigator.take_payload()) {
            MapView::Marker { latitude, longitude, title } => {
                tracing::info!(%title, latitude, longitude, "map marker")
            }
            MapView::NoLocation { message } => tracing::info!("{message}"),
        }
        navigator.back();
    }

    if store.is_dirty() {
        store.flush().await.context("final flush")?;
    }
    tracing::info!(posts = store.len(), "session finished");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Stands in for the UI toast layer.
fn spawn_notice_logger(notices: &Notices) {
    let mut rx = notices.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notice) => tracing::info!(%notice, "notice"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notice logger lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
