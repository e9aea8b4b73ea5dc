//! Main CLI application
//!
//! Builds a clap command dynamically from the loaded configuration and
//! dispatches into the task engine. The resolver owns default-value
//! semantics, so option flags are built *without* `.default_value()` -
//! clap only needs to know whether a flag was passed at all.

use crate::config::{parse_config_auto, parse_config_file, Config};
use crate::error::{ConfigError, TaskRunnerError};
use crate::runner::context::{Context, Verbosity};
use crate::runner::engine::run_task;
use crate::runner::resolve::OptionInputs;
use clap::{Arg, ArgAction, ArgMatches, Command};
use indexmap::IndexMap;
use std::path::PathBuf;

/// CLI application
pub struct App {
    command: Command,
    config: Config,
    config_path: PathBuf,
}

impl App {
    /// Create a new app by discovering the configuration file from the
    /// current directory upward.
    pub fn new() -> Result<Self, TaskRunnerError> {
        let (config, config_path) = parse_config_auto()?;
        let command = build_command(&config);
        Ok(App {
            command,
            config,
            config_path,
        })
    }

    /// Create an app from an explicit configuration file path.
    pub fn with_config_file(path: PathBuf) -> Result<Self, TaskRunnerError> {
        let config = parse_config_file(&path)?;
        let command = build_command(&config);
        Ok(App {
            command,
            config,
            config_path: path,
        })
    }

    /// Parse arguments and run whichever task was selected.
    pub fn run(mut self) -> Result<(), TaskRunnerError> {
        let matches = self.command.clone().get_matches();
        let verbosity = get_verbosity(&matches);

        let (task_name, task_matches) = match matches.subcommand() {
            Some((name, sub_matches)) => (name.to_string(), sub_matches),
            None => {
                self.command.print_help().ok();
                println!();
                return Ok(());
            }
        };

        let task = self
            .config
            .tasks
            .get(&task_name)
            .ok_or_else(|| ConfigError::Invalid(format!("task '{}' is not defined", task_name)))?;

        let flags = collect_flags(&self.config, task, task_matches);

        let mut ctx = Context::new()
            .with_config_path(self.config_path.clone())
            .with_verbosity(verbosity);

        if let Some(interpreter) = &self.config.interpreter {
            ctx = ctx.with_interpreter(interpreter.clone());
        }

        let inputs = OptionInputs {
            flags,
            parent_args: IndexMap::new(),
        };

        run_task(&self.config, &task_name, inputs, &mut ctx)
    }
}

/// Build the clap command tree from the configuration: one subcommand per
/// non-private task, one long flag (plus optional short flag) per
/// non-private option.
fn build_command(config: &Config) -> Command {
    let mut cmd = Command::new(config.name.clone().unwrap_or_else(|| "tusk".to_string()))
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            config
                .usage
                .clone()
                .unwrap_or_else(|| "A declarative, YAML-configured task runner".to_string()),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to the tusk.yml/tusk.yaml config file")
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no diagnostic output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose diagnostic output")
                .action(ArgAction::SetTrue)
                .global(true),
        );

    for (task_name, task) in &config.tasks {
        if task.private {
            continue;
        }

        let mut task_cmd = Command::new(task_name).about(task.usage.clone().unwrap_or_default());
        if let Some(desc) = &task.description {
            task_cmd = task_cmd.long_about(desc.clone());
        }

        for (opt_name, opt) in config.options.iter().chain(task.options.iter()) {
            if opt.private {
                continue;
            }

            let mut opt_def = Arg::new(opt_name.clone())
                .long(opt_name.clone())
                .help(opt.usage.clone().unwrap_or_else(|| format!("Option: {}", opt_name)));

            if let Some(short) = opt.short {
                opt_def = opt_def.short(short);
            }

            opt_def = match opt.option_type.as_str() {
                "bool" | "boolean" => opt_def
                    .num_args(0..=1)
                    .default_missing_value("true")
                    .require_equals(true),
                _ => opt_def.value_name(opt_name.to_uppercase()),
            };

            task_cmd = task_cmd.arg(opt_def);
        }

        cmd = cmd.subcommand(task_cmd);
    }

    cmd
}

fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Build the flag-sourced input map: only options the user actually typed
/// a flag for are present. Everything else is left to the resolver's
/// env/parent-arg/default/zero-value fallbacks.
fn collect_flags(
    config: &Config,
    task: &crate::config::types::TaskDef,
    matches: &ArgMatches,
) -> IndexMap<String, String> {
    let mut flags = IndexMap::new();
    for opt_name in config.options.keys().chain(task.options.keys()) {
        if let Some(value) = matches.get_one::<String>(opt_name) {
            flags.insert(opt_name.clone(), value.clone());
        }
    }
    flags
}

/// Run the CLI with the process's own arguments.
pub fn run() -> Result<(), TaskRunnerError> {
    let args: Vec<String> = std::env::args().collect();
    let app = match extract_file_arg(&args) {
        Some(path) => App::with_config_file(path)?,
        None => App::new()?,
    };
    app.run()
}

/// `--file`/`-f` is resolved before clap parses the rest, since it decides
/// which config builds the rest of the command tree.
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    for i in 0..args.len() {
        if (args[i] == "--file" || args[i] == "-f") && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
    }
    None
}
