//! External tool invocation.
//!
//! The fetch tool, renderer and video tool are reached through the
//! `ToolRunner` trait: an argument list goes in, an exit status and the
//! elapsed time come out. `ProcessRunner` spawns real processes; tests
//! substitute recording fakes.

mod runner;

pub use runner::{ProcessRunner, ToolInvocation, ToolOutcome, ToolRunner};
