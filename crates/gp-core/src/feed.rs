//! # Feed Renderer
//!
//! Projects the [`PostStore`] into list rows and routes the per-post
//! "comments" and "location" actions.

use std::sync::Arc;

use tracing::debug;

use crate::models::{CapturedPhoto, Post};
use crate::store::PostStore;
use crate::traits::Navigator;
use crate::transfer::{NavPayload, Screen};

pub const EMPTY_FEED_TEXT: &str = "No posts available";

/// One rendered row of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub index: usize,
    pub picture: CapturedPhoto,
    pub name: String,
    pub address: String,
    pub comment_count: usize,
    pub has_location: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedView {
    Empty { message: &'static str },
    Posts(Vec<FeedItem>),
}

/// Pure projection of posts into rows, in store order.
pub fn project(posts: &[Post]) -> Vec<FeedItem> {
    posts
        .iter()
        .enumerate()
        .map(|(index, post)| FeedItem {
            index,
            picture: post.picture.clone(),
            name: post.name.clone(),
            address: post.display_address().to_string(),
            comment_count: post.comment_count(),
            has_location: post.location.is_some(),
        })
        .collect()
}

pub struct FeedRenderer {
    store: Arc<PostStore>,
    navigator: Arc<dyn Navigator>,
}

impl FeedRenderer {
    pub fn new(store: Arc<PostStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub fn render(&self) -> FeedView {
        let posts = self.store.posts();
        if posts.is_empty() {
            FeedView::Empty {
                message: EMPTY_FEED_TEXT,
            }
        } else {
            FeedView::Posts(project(&posts))
        }
    }

    /// Consumes a freshly composed post addressed to the feed and stores it.
    /// Any other payload is left in place.
    pub async fn receive(&self) -> Option<usize> {
        if self.navigator.current_screen() != Some(Screen::Posts) {
            return None;
        }
        if !matches!(self.navigator.current_payload(), Some(NavPayload::Composed(_))) {
            return None;
        }
        match self.navigator.take_payload() {
            Some(NavPayload::Composed(composed)) => {
                Some(self.store.append(composed.into_post()).await)
            }
            _ => None,
        }
    }

    /// Opens the map for the selected post. Returns whether navigation happened.
    pub fn view_location(&self, selection: Option<usize>) -> bool {
        let Some((index, post)) = self.selected(selection) else {
            return false;
        };
        self.navigator.navigate(
            Screen::Map,
            Some(NavPayload::Map {
                index,
                name: post.name,
                location: post.location,
            }),
        );
        true
    }

    /// Opens the comment thread for the selected post, passing it by value.
    pub fn open_comments(&self, selection: Option<usize>) -> bool {
        let Some((index, post)) = self.selected(selection) else {
            return false;
        };
        self.navigator
            .navigate(Screen::Comments, Some(NavPayload::Comments { index, post }));
        true
    }

    fn selected(&self, selection: Option<usize>) -> Option<(usize, Post)> {
        let index = selection?;
        match self.store.get(index) {
            Some(post) => Some((index, post)),
            None => {
                debug!(index, len = self.store.len(), "ignoring selection outside the feed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comment, LocationFix, ADDRESS_PLACEHOLDER};
    use crate::notice::Notices;
    use crate::traits::{MockNavigator, MockSnapshotStore};
    use crate::transfer::ComposedPost;

    fn store() -> Arc<PostStore> {
        let mut snapshots = MockSnapshotStore::new();
        snapshots.expect_save().returning(|_| Ok(()));
        Arc::new(PostStore::empty(Arc::new(snapshots), Notices::default()))
    }

    fn post(name: &str, address: Option<&str>) -> Post {
        Post::new(
            CapturedPhoto::new(format!("file:///{name}.jpg")),
            name,
            Some(LocationFix::new(0.0, 0.0)),
            address.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn renders_in_insertion_order_with_zero_comments() {
        let store = store();
        for name in ["A", "B", "C"] {
            store.append(post(name, None)).await;
        }
        let feed = FeedRenderer::new(store.clone(), Arc::new(MockNavigator::new()));

        let FeedView::Posts(items) = feed.render() else {
            panic!("feed should not be empty");
        };
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert!(items.iter().all(|i| i.comment_count == 0));
        assert!(items.iter().all(|i| i.address == ADDRESS_PLACEHOLDER));

        store.append_comment(1, Comment::new("ann", "wow")).await.unwrap();
        let FeedView::Posts(items) = feed.render() else {
            panic!("feed should not be empty");
        };
        assert_eq!(items[1].comment_count, 1);
    }

    #[test]
    fn empty_store_renders_empty_state() {
        let feed = FeedRenderer::new(store(), Arc::new(MockNavigator::new()));
        assert_eq!(
            feed.render(),
            FeedView::Empty {
                message: "No posts available"
            }
        );
    }

    #[test]
    fn view_location_on_empty_store_does_not_navigate() {
        let mut nav = MockNavigator::new();
        nav.expect_navigate().never();
        let feed = FeedRenderer::new(store(), Arc::new(nav));
        assert!(!feed.view_location(Some(0)));
        assert!(!feed.view_location(None));
        assert!(!feed.open_comments(Some(0)));
    }

    #[tokio::test]
    async fn open_comments_sends_selected_post_snapshot() {
        let store = store();
        store.append(post("A", None)).await;
        store.append(post("B", Some("Lviv"))).await;
        let expected = store.get(1).unwrap();

        let mut nav = MockNavigator::new();
        nav.expect_navigate()
            .withf(move |screen, payload| {
                *screen == Screen::Comments
                    && *payload
                        == Some(NavPayload::Comments {
                            index: 1,
                            post: expected.clone(),
                        })
            })
            .times(1)
            .return_const(());
        let feed = FeedRenderer::new(store, Arc::new(nav));
        assert!(feed.open_comments(Some(1)));
    }

    #[tokio::test]
    async fn receive_appends_composed_post_once() {
        let composed = ComposedPost {
            picture: CapturedPhoto::new("file:///c.jpg"),
            name: "C".into(),
            location: None,
            address: None,
        };
        let mut nav = MockNavigator::new();
        nav.expect_current_screen().return_const(Some(Screen::Posts));
        let mut pending = Some(NavPayload::Composed(composed.clone()));
        nav.expect_current_payload()
            .times(2)
            .returning(move || pending.take());
        nav.expect_take_payload()
            .times(1)
            .returning(move || Some(NavPayload::Composed(composed.clone())));

        let store = store();
        let feed = FeedRenderer::new(store.clone(), Arc::new(nav));
        assert_eq!(feed.receive().await, Some(0));
        assert_eq!(feed.receive().await, None);
        assert_eq!(store.get(0).unwrap().display_address(), "Not provided");
    }
}
