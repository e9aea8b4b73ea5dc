//! Shell command execution
//!
//! Every command runs through the configured interpreter (`SHELL`/`sh` by
//! default, overridable via `interpreter:`) with a single `-c <command>`
//! argument.

use crate::error::TaskRunnerError;
use crate::runner::context::Context;
use std::process::{Command as StdCommand, Stdio};

/// Run a command string, inheriting stdio. Non-zero exit becomes
/// `TaskRunnerError::Command(code)`, carrying the exit status outward.
pub fn execute_command(exec_str: &str, ctx: &Context) -> Result<(), TaskRunnerError> {
    ctx.print_run(exec_str);

    let mut command = build_command(exec_str, ctx);
    command.stdin(Stdio::inherit());
    command.stdout(Stdio::inherit());
    command.stderr(Stdio::inherit());

    let status = command.status()?;

    if !status.success() {
        return Err(TaskRunnerError::Command(status.code().unwrap_or(1)));
    }
    Ok(())
}

/// Run a command with its output suppressed, reporting only success/failure.
/// Used for `when` predicate `command` checks, where a non-zero exit is a
/// normal `false`, never an error.
pub fn check_command(exec_str: &str, ctx: &Context) -> Result<bool, TaskRunnerError> {
    let mut command = build_command(exec_str, ctx);
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    let status = command.status()?;
    Ok(status.success())
}

/// Run a command and capture its trimmed stdout, for a default clause's
/// `command` producer. A non-zero exit is a real failure here (unlike
/// `check_command`) and propagates as `Command(code)`.
pub fn capture_command(exec_str: &str, ctx: &Context) -> Result<String, TaskRunnerError> {
    let mut command = build_command(exec_str, ctx);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::inherit());

    let output = command.output()?;
    if !output.status.success() {
        return Err(TaskRunnerError::Command(output.status.code().unwrap_or(1)));
    }

    let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if stdout.ends_with('\n') {
        stdout.pop();
        if stdout.ends_with('\r') {
            stdout.pop();
        }
    }
    Ok(stdout)
}

fn build_command(exec_str: &str, ctx: &Context) -> StdCommand {
    let mut command = StdCommand::new(&ctx.interpreter[0]);
    if ctx.interpreter.len() > 1 {
        command.args(&ctx.interpreter[1..]);
    }
    command.arg(exec_str);
    command.current_dir(&ctx.working_dir);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_simple_command() {
        let ctx = Context::new();
        assert!(execute_command("echo test", &ctx).is_ok());
    }

    #[test]
    fn test_execute_failing_command() {
        let ctx = Context::new();
        let result = execute_command("exit 3", &ctx);
        assert!(matches!(result, Err(TaskRunnerError::Command(3))));
    }

    #[test]
    fn test_check_command_success() {
        let ctx = Context::new();
        assert_eq!(check_command("true", &ctx).unwrap(), true);
    }

    #[test]
    fn test_check_command_failure_is_not_an_error() {
        let ctx = Context::new();
        assert_eq!(check_command("false", &ctx).unwrap(), false);
    }

    #[test]
    fn test_capture_command_trims_newline() {
        let ctx = Context::new();
        let output = capture_command("echo hello", &ctx).unwrap();
        assert_eq!(output, "hello");
    }

    #[test]
    fn test_capture_command_propagates_failure() {
        let ctx = Context::new();
        let result = capture_command("exit 5", &ctx);
        assert!(matches!(result, Err(TaskRunnerError::Command(5))));
    }
}
