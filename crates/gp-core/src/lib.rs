//! geopost/crates/gp-core/src/lib.rs
//!
//! The central domain logic and interface definitions for GeoPost:
//! permission gating, capture, location, screen handoff, the post store
//! and the feed projection.

pub mod capture;
pub mod error;
pub mod feed;
pub mod location;
pub mod models;
pub mod notice;
pub mod permission;
pub mod screens;
pub mod store;
pub mod traits;
pub mod transfer;

// Re-exporting for easier access in other crates
pub use capture::{CaptureSession, ShutterOutcome};
pub use error::*;
pub use feed::{FeedItem, FeedRenderer, FeedView};
pub use location::{LocationResolver, ResolverState};
pub use models::*;
pub use notice::{Notice, Notices};
pub use permission::{GateView, PermissionGate};
pub use screens::{CommentsScreen, MapView};
pub use store::PostStore;
pub use traits::*;
pub use transfer::{CaptureHandoff, ComposedPost, NavPayload, PostComposer, Screen};

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn test_post_serde_keeps_every_field() {
        let mut post = Post::new(
            CapturedPhoto::new("file:///data/captures/1.jpg"),
            "Sunset",
            Some(LocationFix::new(46.48, 30.72)),
            Some("Odesa".to_string()),
        );
        post.comments.push(Comment::new("ann", "Beautiful"));

        let json = serde_json::to_string(&post).unwrap();
        let back: Post = serde_json::from_str(&json).unwrap();
        assert_eq!(back, post);
    }

    #[test]
    fn test_facing_toggles_between_lenses() {
        assert_eq!(Facing::default(), Facing::Back);
        assert_eq!(Facing::Back.toggled(), Facing::Front);
    }

    #[test]
    fn test_missing_address_uses_placeholder() {
        let post = Post::new(CapturedPhoto::new("p"), "n", None, None);
        assert_eq!(post.display_address(), "Not provided");
    }
}
