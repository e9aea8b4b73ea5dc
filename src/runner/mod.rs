//! Task execution engine
//!
//! This module handles the execution of tasks: option resolution,
//! interpolation, `when` predicate evaluation, command execution, and the
//! engine that ties them together into a full task run.

pub mod command;
pub mod context;
pub mod engine;
pub mod interpolate;
pub mod resolve;
pub mod when;

// Re-export main types
pub use command::*;
pub use context::*;
pub use engine::*;
pub use interpolate::*;
pub use resolve::*;
pub use when::*;
