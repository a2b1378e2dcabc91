//! clip-poster core - backend logic for the clip video pipeline
//!
//! This crate fetches a recorded clip from object storage, drives the
//! external renderer and video tool over it, and publishes the resulting
//! video. It has no CLI dependencies and can be driven from tests with
//! fake tool runners and uploaders.

pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod storage;
pub mod tools;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
