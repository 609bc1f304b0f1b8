use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use gp_core::traits::SnapshotStore;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Keeps the post store snapshot in a single file.
///
/// Writes go to `<file>.tmp`, are synced, then renamed over the target, so a
/// reader only ever sees a complete snapshot.
pub struct FileSnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("snapshot"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> anyhow::Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn save(&self, snapshot: &[u8]) -> anyhow::Result<()> {
        let _write = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        // 1. Write to a temporary sibling
        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)
            .await
            .with_context(|| format!("creating {}", temp_path.display()))?;
        file.write_all(snapshot).await?;
        file.sync_all().await?;
        drop(file);

        // 2. Atomic rename over the previous snapshot
        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), bytes = snapshot.len(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("posts.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested").join("posts.json"));

        store.save(b"first").await.unwrap();
        store.save(b"second").await.unwrap();

        assert_eq!(store.load().await.unwrap().as_deref(), Some(&b"second"[..]));
        assert_eq!(std::fs::read(store.path()).unwrap(), b"second");
        assert!(!store.temp_path().exists());
    }
}
