//! Configuration file parsing and discovery

use crate::config::schema::validate_config;
use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, TaskRunnerError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names to search for, in priority order.
const CONFIG_FILE_NAMES: &[&str] = &["tusk.yml", "tusk.yaml"];

/// Find the configuration file by searching the current directory and then
/// each ancestor in turn.
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory.
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a configuration file from a path.
pub fn parse_config_file(path: &Path) -> Result<Config, TaskRunnerError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("failed to read {}: {}", path.display(), e)))?;
    parse_config(&contents)
}

/// Parse and validate configuration from a YAML string.
pub fn parse_config(yaml: &str) -> Result<Config, TaskRunnerError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse configuration with automatic file discovery, starting from the
/// current directory.
pub fn parse_config_auto() -> Result<(Config, PathBuf), TaskRunnerError> {
    let config_path = find_config_file()?;
    let config = parse_config_file(&config_path)?;
    Ok((config, config_path))
}
