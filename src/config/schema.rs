//! Configuration validation
//!
//! Structural checks that can be decided without resolving or running
//! anything: option type names, the required/private/default invariant,
//! and short-flag uniqueness within a task's combined option scope.
//! Cross-task sub-task lookups and option-reference validity inside
//! `when` guards are deliberately left to runtime (see `runner::when` and
//! `runner::engine`), since they depend on which scope is actually in
//! play at evaluation time.

use crate::config::types::{Config, OptionDef, TaskDef};
use crate::error::{ConfigError, ConfigResult};
use std::collections::HashMap;

/// Validate a complete configuration.
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    for (name, option) in &config.options {
        validate_option(name, option)?;
    }

    for (task_name, task) in &config.tasks {
        validate_task(task_name, task, config)?;
    }

    Ok(())
}

fn validate_task(_task_name: &str, task: &TaskDef, config: &Config) -> ConfigResult<()> {
    for (name, option) in &task.options {
        validate_option(name, option)?;
    }

    let mut short_flags: HashMap<char, String> = HashMap::new();
    for (name, option) in config.options.iter().chain(task.options.iter()) {
        if let Some(short) = option.short {
            if let Some(existing) = short_flags.insert(short, name.clone()) {
                if existing != *name {
                    return Err(ConfigError::Invalid(format!(
                        "short flag '-{}' is used by both '{}' and '{}'",
                        short, existing, name
                    )));
                }
            }
        }
    }

    Ok(())
}

fn validate_option(name: &str, option: &OptionDef) -> ConfigResult<()> {
    validate_option_type(&option.option_type)?;

    if option.required && (option.private || !option.default.is_empty()) {
        return Err(ConfigError::RequiredConflict(name.to_string()));
    }

    Ok(())
}

fn validate_option_type(option_type: &str) -> ConfigResult<()> {
    match option_type {
        "string" | "bool" | "boolean" | "int" | "integer" | "float" => Ok(()),
        _ => Err(ConfigError::Invalid(format!(
            "invalid option type: {}. Must be one of: string, bool, int, float",
            option_type
        ))),
    }
}
