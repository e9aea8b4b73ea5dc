//! Error types for the task runner.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TaskRunnerError>;

/// Top-level error type covering every way a run can abort.
///
/// `Command` is deliberately a variant of this enum rather than a side
/// channel: every abort path, whether a bad config or a failed shell
/// command, flows through the same `?`-propagated `Result`, and `main`
/// picks the process exit code from whichever variant it sees.
#[derive(Error, Debug)]
pub enum TaskRunnerError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("option '{0}' is required but was not provided")]
    MissingRequired(String),

    #[error("value '{value}' is not among the allowed values for option '{name}'")]
    InvalidValue { name: String, value: String },

    #[error("value '{value}' is not a valid {expected} for option '{name}'")]
    TypeError {
        name: String,
        expected: &'static str,
        value: String,
    },

    #[error("task '{0}' is not defined")]
    LookupFailure(String),

    /// A shell command exited non-zero; carries the exit code to propagate.
    #[error("command exited with status {0}")]
    Command(i32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration-schema and predicate-evaluation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no configuration file found (searched: {0})")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("circular option reference involving '{0}'")]
    CircularDependency(String),

    #[error("'{0}' is not a declared option in this scope")]
    UnknownOption(String),

    #[error("run item has more than one action (command, set-environment, task)")]
    MultipleActions,

    #[error("required option '{0}' cannot also declare private or default values")]
    RequiredConflict(String),
}

/// Specialized result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Picks a process exit code for a given top-level error.
///
/// `Command` mirrors the failing child's own status; everything else is a
/// configuration or usage problem and gets the small fixed code.
pub fn exit_code_for(err: &TaskRunnerError) -> i32 {
    match err {
        TaskRunnerError::Command(code) => *code,
        _ => 1,
    }
}
