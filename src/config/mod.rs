//! Configuration parsing and validation
//!
//! This module handles parsing of tusk.yml configuration files
//! and validation of configuration structure.

pub mod parse;
pub mod schema;
pub mod types;

pub use parse::{find_config_file, find_config_file_from, parse_config, parse_config_auto, parse_config_file};
pub use schema::validate_config;
pub use types::*;
