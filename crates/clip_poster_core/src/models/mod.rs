//! Data models for clip-poster.
//!
//! This module contains the small set of values the pipeline passes around:
//! - Enums for endpoint selection and stage status
//! - The input locator and the remote key derived from it

mod enums;
mod locator;

// Re-export all public types
pub use enums::{SelectionPolicy, StageStatus};
pub use locator::{InputLocator, LocatorError};
