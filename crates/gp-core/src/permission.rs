//! # Permission Gate
//!
//! Tracks the authorization state of each capability and decides whether the
//! capture screen may show its preview.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{Capability, PermissionState};
use crate::traits::PermissionProvider;

/// What the capture screen should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    Ready,
    /// Explanatory view with a re-request action. Nothing is shown behind it.
    Blocked {
        capability: Capability,
        message: &'static str,
    },
}

/// Explanation shown when `capability` is not granted.
pub fn blocked_message(capability: Capability) -> &'static str {
    match capability {
        Capability::Camera => "We need your permission to show the camera",
        Capability::MediaLibrary => "We need your permission to save the photo",
        Capability::Location => "Permission to access location was denied",
    }
}

pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    states: Mutex<HashMap<Capability, PermissionState>>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self {
            provider,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Last known state; `Undetermined` until checked or requested.
    pub fn state(&self, capability: Capability) -> PermissionState {
        self.states
            .lock()
            .get(&capability)
            .copied()
            .unwrap_or_default()
    }

    /// Reads the platform state without prompting.
    pub async fn check(&self, capability: Capability) -> PermissionState {
        match self.provider.check(capability).await {
            Ok(state) => self.record(capability, state),
            Err(err) => {
                warn!(%capability, error = %err, "permission check failed; keeping cached state");
                self.state(capability)
            }
        }
    }

    /// Prompts the user. Suspends until the prompt resolves or is suppressed.
    pub async fn request(&self, capability: Capability) -> PermissionState {
        match self.provider.request(capability).await {
            Ok(state) => {
                info!(%capability, ?state, "permission request resolved");
                self.record(capability, state)
            }
            Err(err) => {
                warn!(%capability, error = %err, "permission request failed; keeping cached state");
                self.state(capability)
            }
        }
    }

    pub fn ensure(&self, capability: Capability) -> Result<()> {
        if self.state(capability).is_granted() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(capability))
        }
    }

    /// Checks Camera, then MediaLibrary, and reports the first one missing.
    pub async fn capture_readiness(&self) -> GateView {
        for capability in [Capability::Camera, Capability::MediaLibrary] {
            if !self.check(capability).await.is_granted() {
                return GateView::Blocked {
                    capability,
                    message: blocked_message(capability),
                };
            }
        }
        GateView::Ready
    }

    fn record(&self, capability: Capability, state: PermissionState) -> PermissionState {
        self.states.lock().insert(capability, state);
        state
    }
}
