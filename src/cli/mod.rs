//! CLI interface and argument parsing
//!
//! This module handles command-line interface parsing and help generation.

pub mod app;

pub use app::*;
