//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Policy for picking one gateway out of the endpoint pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Uniformly random pick, once per selection.
    #[default]
    Random,
    /// Cycle through the pool in configured order.
    RoundRobin,
    /// Try endpoints in random order, take the first that accepts a connection.
    HealthAware,
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionPolicy::Random => write!(f, "random"),
            SelectionPolicy::RoundRobin => write!(f, "round_robin"),
            SelectionPolicy::HealthAware => write!(f, "health_aware"),
        }
    }
}

/// Recorded outcome of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Stage ran to completion.
    Succeeded,
    /// Stage raised an error and stopped the pipeline.
    Failed,
    /// Stage did not run.
    Skipped,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::Succeeded => write!(f, "succeeded"),
            StageStatus::Failed => write!(f, "failed"),
            StageStatus::Skipped => write!(f, "skipped"),
        }
    }
}
