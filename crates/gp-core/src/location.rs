//! # Location Resolver
//!
//! Best-effort device location for one screen instance.
//! `Idle -> RequestingPermission -> {Denied | Resolving -> {Resolved | Unavailable}}`.
//! An absent fix is an expected outcome and never an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::models::{Capability, LocationFix};
use crate::notice::{Notice, Notices};
use crate::permission::{blocked_message, PermissionGate};
use crate::traits::Locator;

/// Shown while the first resolution is still pending.
pub const WAITING_TEXT: &str = "Waiting...";

#[derive(Debug, Clone, PartialEq)]
pub enum ResolverState {
    Idle,
    RequestingPermission,
    Denied,
    Resolving,
    Resolved(LocationFix),
    Unavailable(String),
}

pub struct LocationResolver {
    gate: Arc<PermissionGate>,
    locator: Arc<dyn Locator>,
    notices: Notices,
    timeout: Duration,
    state: Mutex<ResolverState>,
    /// Held for the whole duration of an attempt.
    in_flight: tokio::sync::Mutex<()>,
}

/// Puts the resolver back to `Idle` if an attempt is dropped before it settles.
struct AttemptGuard<'a> {
    state: &'a Mutex<ResolverState>,
    settled: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.state.lock() = ResolverState::Idle;
        }
    }
}

impl LocationResolver {
    pub fn new(
        gate: Arc<PermissionGate>,
        locator: Arc<dyn Locator>,
        notices: Notices,
        timeout: Duration,
    ) -> Self {
        Self {
            gate,
            locator,
            notices,
            timeout,
            state: Mutex::new(ResolverState::Idle),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> ResolverState {
        self.state.lock().clone()
    }

    pub fn current_fix(&self) -> Option<LocationFix> {
        match &*self.state.lock() {
            ResolverState::Resolved(fix) => Some(*fix),
            _ => None,
        }
    }

    /// Explanation set by the last Denied or Unavailable outcome.
    pub fn message(&self) -> Option<String> {
        match &*self.state.lock() {
            ResolverState::Denied => Some(blocked_message(Capability::Location).to_string()),
            ResolverState::Unavailable(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Status label for the capture screen.
    pub fn status_text(&self) -> String {
        if let Some(message) = self.message() {
            return message;
        }
        match self.current_fix() {
            Some(fix) => serde_json::to_string(&fix)
                .unwrap_or_else(|_| format!("{}, {}", fix.latitude, fix.longitude)),
            None => WAITING_TEXT.to_string(),
        }
    }

    /// Runs the resolution chain once. A caller that arrives while another
    /// attempt is running waits for it and shares its outcome.
    pub async fn resolve(&self) -> Option<LocationFix> {
        let held = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                let guard = self.in_flight.lock().await;
                // An attempt cancelled mid-flight leaves nothing to share.
                if self.state() != ResolverState::Idle {
                    debug!("reusing location from concurrent attempt");
                    return self.current_fix();
                }
                guard
            }
        };
        self.attempt(held).await
    }

    /// Capture-time lookup: the mounted fix if it is recent enough, otherwise
    /// one fresh attempt. A stale fix still beats no fix.
    pub async fn fix_for_capture(&self, max_age: chrono::Duration) -> Option<LocationFix> {
        let mounted = self.current_fix();
        if let Some(fix) = mounted.filter(|fix| fix.is_fresh(max_age, Utc::now())) {
            return Some(fix);
        }
        self.resolve().await.or(mounted)
    }

    /// `_held` is released only after `guard` has reset a cancelled state.
    async fn attempt(&self, _held: tokio::sync::MutexGuard<'_, ()>) -> Option<LocationFix> {
        let mut guard = AttemptGuard {
            state: &self.state,
            settled: false,
        };
        let fix = self.run_attempt().await;
        guard.settled = true;
        fix
    }

    async fn run_attempt(&self) -> Option<LocationFix> {
        self.set_state(ResolverState::RequestingPermission);
        let permission = match self.gate.state(Capability::Location) {
            granted if granted.is_granted() => granted,
            _ => self.gate.request(Capability::Location).await,
        };
        if !permission.is_granted() {
            info!("location permission not granted; continuing without a fix");
            self.set_state(ResolverState::Denied);
            self.notices.publish(Notice::LocationUnavailable(
                blocked_message(Capability::Location).to_string(),
            ));
            return None;
        }

        self.set_state(ResolverState::Resolving);
        let outcome = match tokio::time::timeout(self.timeout, self.locator.current_fix()).await {
            Ok(Ok(Some(fix))) => Ok(fix),
            Ok(Ok(None)) => Err("Location signal unavailable".to_string()),
            Ok(Err(err)) => Err(format!("Location unavailable: {err}")),
            Err(_) => Err("Timed out waiting for a location fix".to_string()),
        };

        match outcome {
            Ok(fix) => {
                info!(latitude = fix.latitude, longitude = fix.longitude, "location resolved");
                self.set_state(ResolverState::Resolved(fix));
                Some(fix)
            }
            Err(reason) => {
                warn!(%reason, "location resolution degraded to no fix");
                self.set_state(ResolverState::Unavailable(reason.clone()));
                self.notices.publish(Notice::LocationUnavailable(reason));
                None
            }
        }
    }

    fn set_state(&self, state: ResolverState) {
        *self.state.lock() = state;
    }
}
