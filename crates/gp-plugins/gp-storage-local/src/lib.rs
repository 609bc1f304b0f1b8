//! # gp-storage-local
//! geopost/crates/gp-plugins/gp-storage-local/src/lib.rs
//! Filesystem implementations of `SnapshotStore` and `MediaLibrary`.
//! Features: atomic snapshot replacement, content-addressable photo library
//! with directory sharding.

mod media;
mod snapshot;

pub use media::LocalMediaLibrary;
pub use snapshot::FileSnapshotStore;
