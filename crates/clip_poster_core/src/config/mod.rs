//! Configuration management for clip-poster.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Cleanup on load (unknown sections dropped, missing keys defaulted)
//!
//! # Example
//!
//! ```no_run
//! use clip_poster_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/clip-poster.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Workspace: {}", config.settings().paths.workspace_dir);
//!
//! config.settings_mut().tools.fail_on_fetch_error = true;
//! config.update_section(ConfigSection::Tools).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, Settings, StorageSettings, ToolSettings,
};
