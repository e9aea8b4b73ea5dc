//! tusk - A declarative, YAML-configured task runner
//!
//! tusk reads a `tusk.yml`/`tusk.yaml` file describing named tasks, each
//! with its own options and a small run program of shell commands,
//! environment mutations, and sub-task calls, and executes the one
//! requested on the command line.

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod value;

pub use error::{Result, TaskRunnerError};

/// Current version of tusk.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
