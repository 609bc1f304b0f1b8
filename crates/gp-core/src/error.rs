//! # AppError
//!
//! Centralized error handling for the GeoPost core.
//! Capability failures are converted into these variants at the component
//! that invoked the capability.

use thiserror::Error;

use crate::models::Capability;

/// The primary error type for all gp-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// A required capability is not authorized (recoverable via re-request)
    #[error("permission denied: {0}")]
    PermissionDenied(Capability),

    /// The camera or another device failed (recoverable via retry)
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// No location fix could be obtained
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// The snapshot could not be written; memory stays authoritative
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// Positional access past the end of the post store
    #[error("post index {index} out of bounds (len {len})")]
    IndexError { index: usize, len: usize },

    /// Input rejected before reaching the store (e.g. empty comment)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// An operation of this kind is already in flight for the screen
    #[error("{0} already in progress")]
    Busy(&'static str),
}

/// A specialized Result type for GeoPost logic.
pub type Result<T> = std::result::Result<T, AppError>;
