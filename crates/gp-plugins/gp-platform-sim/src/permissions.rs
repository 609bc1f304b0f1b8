use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gp_core::models::{Capability, PermissionState};
use gp_core::traits::PermissionProvider;
use parking_lot::Mutex;

/// Prompts answer once per capability; later requests get the recorded
/// answer without a prompt, the way mobile platforms suppress repeat dialogs.
pub struct SimPermissions {
    answers: HashMap<Capability, bool>,
    states: Mutex<HashMap<Capability, PermissionState>>,
    prompts: AtomicUsize,
}

impl SimPermissions {
    /// Every prompt is accepted.
    pub fn granting_all() -> Self {
        Self {
            answers: HashMap::new(),
            states: Mutex::new(HashMap::new()),
            prompts: AtomicUsize::new(0),
        }
    }

    /// Sets the user's answer for one capability.
    pub fn answer(mut self, capability: Capability, grant: bool) -> Self {
        self.answers.insert(capability, grant);
        self
    }

    /// Number of dialogs actually shown.
    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for SimPermissions {
    async fn check(&self, capability: Capability) -> anyhow::Result<PermissionState> {
        Ok(self
            .states
            .lock()
            .get(&capability)
            .copied()
            .unwrap_or_default())
    }

    async fn request(&self, capability: Capability) -> anyhow::Result<PermissionState> {
        let mut states = self.states.lock();
        let state = states.entry(capability).or_default();
        if *state == PermissionState::Undetermined {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            let grant = self.answers.get(&capability).copied().unwrap_or(true);
            *state = if grant {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            };
            tracing::debug!(%capability, ?state, "simulated permission prompt answered");
        }
        Ok(*state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repeat_request_after_denial_is_suppressed() {
        let perms = SimPermissions::granting_all().answer(Capability::Location, false);

        assert_eq!(perms.check(Capability::Location).await.unwrap(), PermissionState::Undetermined);
        assert_eq!(perms.request(Capability::Location).await.unwrap(), PermissionState::Denied);
        assert_eq!(perms.request(Capability::Location).await.unwrap(), PermissionState::Denied);
        assert_eq!(perms.prompts(), 1);
    }

    #[tokio::test]
    async fn unanswered_capabilities_are_granted() {
        let perms = SimPermissions::granting_all();
        assert_eq!(perms.request(Capability::Camera).await.unwrap(), PermissionState::Granted);
        assert_eq!(perms.check(Capability::Camera).await.unwrap(), PermissionState::Granted);
    }
}
