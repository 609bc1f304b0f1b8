use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use gp_core::models::{CapturedPhoto, Facing, LocationFix};
use gp_core::traits::{Camera, Locator};
use tokio::fs;
use uuid::Uuid;

/// Smallest byte sequence image viewers accept as a JPEG frame.
const PLACEHOLDER_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9,
];

/// Writes a placeholder JPEG per shot into `capture_dir`.
pub struct SimCamera {
    capture_dir: PathBuf,
}

impl SimCamera {
    pub fn new(capture_dir: impl Into<PathBuf>) -> Self {
        Self {
            capture_dir: capture_dir.into(),
        }
    }
}

#[async_trait]
impl Camera for SimCamera {
    async fn capture_photo(&self, facing: Facing) -> anyhow::Result<CapturedPhoto> {
        fs::create_dir_all(&self.capture_dir)
            .await
            .with_context(|| format!("creating {}", self.capture_dir.display()))?;

        let lens = match facing {
            Facing::Front => "front",
            Facing::Back => "back",
        };
        let path = self
            .capture_dir
            .join(format!("capture-{lens}-{}.jpg", Uuid::new_v4()));

        // Unique trailer keeps content hashes distinct between shots
        let mut bytes = PLACEHOLDER_JPEG.to_vec();
        bytes.extend_from_slice(path.to_string_lossy().as_bytes());
        fs::write(&path, bytes).await?;

        Ok(CapturedPhoto::new(format!("file://{}", path.display())))
    }
}

/// Reports a fixed position, or no signal.
pub struct SimLocator {
    position: Option<(f64, f64)>,
    delay: Duration,
}

impl SimLocator {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Some((latitude, longitude)),
            delay: Duration::ZERO,
        }
    }

    pub fn no_signal() -> Self {
        Self {
            position: None,
            delay: Duration::ZERO,
        }
    }

    /// Simulates a slow satellite lock.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Locator for SimLocator {
    async fn current_fix(&self) -> anyhow::Result<Option<LocationFix>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self
            .position
            .map(|(latitude, longitude)| LocationFix::new(latitude, longitude)))
    }
}
