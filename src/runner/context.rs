//! Execution context for task running
//!
//! The context tracks all the state needed during task execution.

use crate::error::ConfigError;
use indexmap::IndexMap;
use std::env;
use std::path::PathBuf;

/// Sub-task calls nest via ordinary recursive re-entry into the engine; a
/// cycle between tasks would otherwise recurse until the stack overflows.
/// This threshold turns that into a reported configuration error instead.
pub const MAX_TASK_DEPTH: usize = 64;

/// Execution context that tracks state during task execution
#[derive(Clone)]
pub struct Context {
    /// Current working directory
    pub working_dir: PathBuf,

    /// Configuration file path
    pub config_path: Option<PathBuf>,

    /// Current task's resolved option scope, by canonical string value
    pub vars: IndexMap<String, String>,

    /// Interpreter to invoke shell commands with (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,

    /// Stack of tasks currently being executed, for the recursion depth guard
    pub task_stack: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Verbosity levels for diagnostic output (distinct from a task's own
/// stdout/stderr, which is always inherited as-is).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_path: None,
            vars: IndexMap::new(),
            interpreter: default_interpreter(),
            task_stack: Vec::new(),
            verbosity: Verbosity::Normal,
        }
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn with_vars(mut self, vars: IndexMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    pub fn set_var(&mut self, key: String, value: String) {
        self.vars.insert(key, value);
    }

    pub fn get_var(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Push a task onto the execution stack, rejecting recursion past
    /// `MAX_TASK_DEPTH`.
    pub fn push_task(&mut self, task_name: String) -> Result<(), ConfigError> {
        if self.task_stack.len() >= MAX_TASK_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "sub-task recursion exceeded depth {} (at '{}')",
                MAX_TASK_DEPTH, task_name
            )));
        }
        self.task_stack.push(task_name);
        Ok(())
    }

    pub fn pop_task(&mut self) -> Option<String> {
        self.task_stack.pop()
    }

    pub fn current_task(&self) -> Option<&String> {
        self.task_stack.last()
    }

    /// Directory the configuration file lives in, used to resolve relative
    /// `exists` paths; falls back to the working directory.
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.working_dir.clone())
    }

    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("[INFO] {}", message);
        }
    }

    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("[ERROR] {}", message);
        }
    }

    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("[DEBUG] {}", message);
        }
    }

    pub fn print_task_start(&self, task_name: &str) {
        self.print_info(&format!("Running task: {}", task_name));
    }

    pub fn print_task_complete(&self, task_name: &str) {
        self.print_debug(&format!("Task completed: {}", task_name));
    }

    pub fn print_task_skip(&self, run_item: &str) {
        self.print_debug(&format!("Skipping run item: {}", run_item));
    }

    pub fn print_run(&self, command: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("[RUN] {}", command);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// `SHELL`, falling back to `sh`; overridden wholesale by a config-level
/// `interpreter:` entry.
fn default_interpreter() -> Vec<String> {
    let shell = env::var("SHELL").unwrap_or_else(|_| "sh".to_string());
    vec![shell, "-c".to_string()]
}
