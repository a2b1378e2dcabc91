//! Input locator and the destination key derived from it.
//!
//! A locator names a clip directory in object storage, e.g.
//! `s3://ros-bags/collected_data/<trip>/<clip>/`. The trip and clip are
//! read from the 3rd-last and 2nd-last `/`-separated segments without any
//! normalization, so the trailing slash matters.

use std::fmt;

use thiserror::Error;

/// Errors from interpreting an input locator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("Locator '{locator}' has {segments} '/'-separated segments, need at least 3")]
    TooFewSegments { locator: String, segments: usize },
}

/// Remote directory holding one recorded clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputLocator {
    raw: String,
}

impl InputLocator {
    /// Wrap a locator string.
    ///
    /// Returns `None` only for the empty string. Anything else, whitespace
    /// included, is accepted as given.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self { raw })
        }
    }

    /// The locator exactly as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Trip and clip names (3rd-last and 2nd-last segments).
    pub fn trip_and_clip(&self) -> Result<(&str, &str), LocatorError> {
        let parts: Vec<&str> = self.raw.split('/').collect();
        let n = parts.len();
        if n < 3 {
            return Err(LocatorError::TooFewSegments {
                locator: self.raw.clone(),
                segments: n,
            });
        }
        Ok((parts[n - 3], parts[n - 2]))
    }

    /// Destination key: `{prefix}/{trip}/{clip}/lidar/{filename}`.
    pub fn remote_key(&self, prefix: &str, filename: &str) -> Result<String, LocatorError> {
        let (trip, clip) = self.trip_and_clip()?;
        Ok(format!("{}/{}/{}/lidar/{}", prefix, trip, clip, filename))
    }

    /// Short name used for the job log and state manifest.
    pub fn job_name(&self) -> String {
        if let Ok((trip, clip)) = self.trip_and_clip() {
            if !trip.trim().is_empty() && !clip.trim().is_empty() {
                return format!("{}_{}", trip, clip);
            }
        }
        self.raw
            .split('/')
            .filter(|s| !s.trim().is_empty())
            .last()
            .map(str::to_string)
            .unwrap_or_else(|| "job".to_string())
    }
}

impl fmt::Display for InputLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
