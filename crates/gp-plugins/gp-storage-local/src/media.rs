use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use gp_core::models::CapturedPhoto;
use gp_core::traits::MediaLibrary;
use sha2::{Digest, Sha256};
use tokio::fs;

/// Local photo gallery. Photos are copied in under their SHA-256 hash,
/// which deduplicates repeated saves of the same image.
pub struct LocalMediaLibrary {
    /// Root directory of the gallery (e.g. "./data/media")
    root_path: PathBuf,
}

impl LocalMediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root.into(),
        }
    }

    /// Generates a sharded path: "ab/cd/abcd...hash.jpg"
    fn get_sharded_path(&self, hash: &str, extension: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(format!("{hash}.{extension}"));
        path
    }

    /// Copies the photo into the gallery and returns where it landed.
    pub async fn import(&self, photo: &CapturedPhoto) -> anyhow::Result<PathBuf> {
        let source = source_path(&photo.uri);
        let data = fs::read(source)
            .await
            .with_context(|| format!("reading capture {}", photo.uri))?;

        let hash = hex::encode(Sha256::digest(&data));
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let target_path = self.get_sharded_path(&hash, extension);

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if !fs::try_exists(&target_path).await? {
            fs::write(&target_path, &data).await?;
            tracing::info!(path = %target_path.display(), "photo added to media library");
        }
        Ok(target_path)
    }
}

/// Maps a `file://` URI (or a bare path) to a filesystem path.
fn source_path(uri: &str) -> &Path {
    Path::new(uri.strip_prefix("file://").unwrap_or(uri))
}

#[async_trait]
impl MediaLibrary for LocalMediaLibrary {
    async fn save(&self, photo: &CapturedPhoto) -> anyhow::Result<()> {
        self.import(photo).await.map(|_| ())
    }
}
