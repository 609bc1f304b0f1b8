//! Comments and map screens. Both read a single post passed by value.

use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Comment, Post};
use crate::store::PostStore;
use crate::transfer::NavPayload;

pub const NO_LOCATION_TEXT: &str = "Location not available";

pub struct CommentsScreen {
    store: Arc<PostStore>,
    index: usize,
    post: Post,
}

impl CommentsScreen {
    /// `None` unless the payload carries a post for this screen.
    pub fn from_payload(store: Arc<PostStore>, payload: Option<NavPayload>) -> Option<Self> {
        match payload? {
            NavPayload::Comments { index, post } => Some(Self { store, index, post }),
            _ => None,
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn comments(&self) -> &[Comment] {
        &self.post.comments
    }

    /// Writes through the store, then refreshes the local snapshot.
    pub async fn submit(&mut self, author: &str, text: &str) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::ValidationError("comment is empty".into()));
        }
        let count = self
            .store
            .append_comment(self.index, Comment::new(author.trim(), text))
            .await?;
        info!(index = self.index, count, "comment posted");
        self.refresh();
        Ok(count)
    }

    /// Re-reads the post from the store.
    pub fn refresh(&mut self) {
        if let Some(post) = self.store.get(self.index) {
            self.post = post;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    Marker {
        latitude: f64,
        longitude: f64,
        title: String,
    },
    NoLocation {
        message: &'static str,
    },
}

impl MapView {
    pub fn from_payload(payload: Option<NavPayload>) -> Self {
        match payload {
            Some(NavPayload::Map {
                name,
                location: Some(fix),
                ..
            }) => MapView::Marker {
                latitude: fix.latitude,
                longitude: fix.longitude,
                title: name,
            },
            _ => MapView::NoLocation {
                message: NO_LOCATION_TEXT,
            },
        }
    }
}
