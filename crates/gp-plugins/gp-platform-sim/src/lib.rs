//! # gp-platform-sim
//!
//! Simulated platform capabilities for running the core without a phone:
//! permission prompts with scripted answers, a camera that writes placeholder
//! JPEGs, a fixed-position locator and an in-memory screen stack.

mod device;
mod navigator;
mod permissions;

pub use device::{SimCamera, SimLocator};
pub use navigator::StackNavigator;
pub use permissions::SimPermissions;
