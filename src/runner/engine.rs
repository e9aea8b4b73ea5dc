//! Task engine and run-item executor
//!
//! Drives a single task invocation end to end: resolve its option scope,
//! then execute its run program item by item, recursing into
//! [`run_task`] again for every sub-task call. The recursion depth guard
//! in [`Context::push_task`] is what keeps a cyclic sub-task graph from
//! exhausting the stack.

use crate::config::types::{Config, RunAction, RunItem, SubTaskCall};
use crate::error::TaskRunnerError;
use crate::runner::command::execute_command;
use crate::runner::context::Context;
use crate::runner::interpolate::{interpolate, interpolate_map};
use crate::runner::resolve::{resolve_task_scope, OptionInputs};
use crate::runner::when::evaluate_when_list;

/// Run the named task to completion: INIT -> RESOLVE_OPTIONS ->
/// INTERPOLATE_RUN -> EXEC_ITEM* -> DONE, with any error aborting the rest
/// of the sequence and propagating to the caller.
pub fn run_task(
    config: &Config,
    task_name: &str,
    inputs: OptionInputs,
    ctx: &mut Context,
) -> Result<(), TaskRunnerError> {
    let task = config
        .tasks
        .get(task_name)
        .ok_or_else(|| TaskRunnerError::LookupFailure(task_name.to_string()))?;

    ctx.push_task(task_name.to_string())?;
    ctx.print_task_start(task_name);

    let saved_vars = std::mem::take(&mut ctx.vars);
    let result = (|| -> Result<(), TaskRunnerError> {
        resolve_task_scope(config, task, &inputs, ctx)?;
        for item in &task.run {
            execute_run_item(config, item, ctx)?;
        }
        Ok(())
    })();
    ctx.vars = saved_vars;

    ctx.pop_task();
    if result.is_ok() {
        ctx.print_task_complete(task_name);
    }
    result
}

fn execute_run_item(
    config: &Config,
    item: &RunItem,
    ctx: &mut Context,
) -> Result<(), TaskRunnerError> {
    let should_run = if item.when.is_empty() {
        true
    } else {
        evaluate_when_list(&item.when, ctx)?
    };
    if !should_run {
        ctx.print_task_skip(&describe_run_item(item));
        return Ok(());
    }

    match &item.action {
        RunAction::Command(commands) => {
            for raw in commands {
                let cmd = interpolate(raw, &ctx.vars);
                execute_command(&cmd, ctx)?;
            }
        }
        RunAction::SetEnvironment(map) => {
            for (name, value) in map {
                match value {
                    Some(raw) => {
                        let interpolated = interpolate(raw, &ctx.vars);
                        std::env::set_var(name, &interpolated);
                    }
                    None => std::env::remove_var(name),
                }
            }
        }
        RunAction::Task(call) => execute_subtask(config, call, ctx)?,
    }

    Ok(())
}

/// Interpolate the caller's argument map against its own scope, then
/// re-enter [`run_task`] with those values available only as parent-args
/// (priority rule 3 of the option resolver).
fn execute_subtask(
    config: &Config,
    call: &SubTaskCall,
    ctx: &mut Context,
) -> Result<(), TaskRunnerError> {
    let parent_args = interpolate_map(&call.options, &ctx.vars);
    let inputs = OptionInputs {
        flags: Default::default(),
        parent_args,
    };
    run_task(config, &call.name, inputs, ctx)
}

fn describe_run_item(item: &RunItem) -> String {
    match &item.action {
        RunAction::Command(cmds) => cmds.join(" && "),
        RunAction::SetEnvironment(_) => "set-environment".to_string(),
        RunAction::Task(call) => format!("task: {}", call.name),
    }
}
