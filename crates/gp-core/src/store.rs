//! # Post Store
//!
//! Append-only, positionally indexed list of posts shared by every screen.
//! Each mutation bumps a generation counter and flushes a full snapshot.
//! A failed flush leaves memory authoritative; the next mutation rewrites
//! everything, which doubles as the retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{Comment, Post};
use crate::notice::{Notice, Notices};
use crate::traits::SnapshotStore;

pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk layout of the persisted store.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    generation: u64,
    posts: Vec<Post>,
}

#[derive(Debug, Default)]
struct StoreState {
    posts: Vec<Post>,
    generation: u64,
}

pub struct PostStore {
    snapshots: Arc<dyn SnapshotStore>,
    notices: Notices,
    state: Mutex<StoreState>,
    persisted: AtomicU64,
    flush_lock: tokio::sync::Mutex<()>,
}

impl PostStore {
    pub fn empty(snapshots: Arc<dyn SnapshotStore>, notices: Notices) -> Self {
        Self::from_state(snapshots, notices, StoreState::default())
    }

    /// Loads the last snapshot. Anything unreadable starts an empty store.
    pub async fn rehydrate(snapshots: Arc<dyn SnapshotStore>, notices: Notices) -> Self {
        let state = match snapshots.load().await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Snapshot>(&bytes) {
                Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => {
                    info!(
                        posts = snapshot.posts.len(),
                        generation = snapshot.generation,
                        "post store rehydrated"
                    );
                    StoreState {
                        posts: snapshot.posts,
                        generation: snapshot.generation,
                    }
                }
                Ok(snapshot) => {
                    warn!(
                        version = snapshot.version,
                        "unsupported snapshot version; starting empty"
                    );
                    StoreState::default()
                }
                Err(err) => {
                    warn!(error = %err, "corrupt snapshot; starting empty");
                    StoreState::default()
                }
            },
            Ok(None) => {
                debug!("no snapshot found; starting empty");
                StoreState::default()
            }
            Err(err) => {
                warn!(error = %err, "snapshot load failed; starting empty");
                StoreState::default()
            }
        };
        Self::from_state(snapshots, notices, state)
    }

    fn from_state(snapshots: Arc<dyn SnapshotStore>, notices: Notices, state: StoreState) -> Self {
        let generation = state.generation;
        Self {
            snapshots,
            notices,
            state: Mutex::new(state),
            persisted: AtomicU64::new(generation),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the post at `index`.
    pub fn get(&self, index: usize) -> Option<Post> {
        self.state.lock().posts.get(index).cloned()
    }

    /// Copy of all posts in creation order.
    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().posts.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// True when memory holds changes the last flush did not persist.
    pub fn is_dirty(&self) -> bool {
        self.generation() > self.persisted.load(Ordering::Acquire)
    }

    /// Appends a post and returns its position.
    pub async fn append(&self, post: Post) -> usize {
        let index = {
            let mut state = self.state.lock();
            state.posts.push(post);
            state.generation += 1;
            state.posts.len() - 1
        };
        debug!(index, "post appended");
        self.flush_or_notify().await;
        index
    }

    /// Appends to the comment thread of the post at `index` and returns the
    /// new comment count.
    pub async fn append_comment(&self, index: usize, comment: Comment) -> Result<usize> {
        let count = {
            let mut state = self.state.lock();
            let len = state.posts.len();
            let post = state
                .posts
                .get_mut(index)
                .ok_or(AppError::IndexError { index, len })?;
            post.comments.push(comment);
            let count = post.comments.len();
            state.generation += 1;
            count
        };
        debug!(index, count, "comment appended");
        self.flush_or_notify().await;
        Ok(count)
    }

    /// Writes the current generation unless it is already persisted.
    /// Concurrent flushes are serialized; a stale one becomes a no-op.
    pub async fn flush(&self) -> Result<()> {
        let _flush = self.flush_lock.lock().await;
        let snapshot = {
            let state = self.state.lock();
            if state.generation <= self.persisted.load(Ordering::Acquire) {
                return Ok(());
            }
            Snapshot {
                version: SNAPSHOT_VERSION,
                generation: state.generation,
                posts: state.posts.clone(),
            }
        };

        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|err| AppError::PersistenceFailure(err.to_string()))?;
        self.snapshots
            .save(&bytes)
            .await
            .map_err(|err| AppError::PersistenceFailure(err.to_string()))?;
        self.persisted.store(snapshot.generation, Ordering::Release);
        debug!(generation = snapshot.generation, "snapshot flushed");
        Ok(())
    }

    async fn flush_or_notify(&self) {
        if let Err(err) = self.flush().await {
            warn!(error = %err, "post store flush failed; will retry on next change");
            self.notices.publish(Notice::PersistenceFailed(err.to_string()));
        }
    }
}
