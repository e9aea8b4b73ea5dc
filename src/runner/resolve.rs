//! Option resolution
//!
//! Builds a task's option scope: dependency-orders the options that are in
//! play, then resolves each in turn by the priority lattice (flag > env >
//! parent-arg > first-matching-default > zero-value), making every already
//! resolved value available to the next option's interpolation.

use crate::config::types::{CheckGroup, Config, DefaultProducer, OptionDef, TaskDef};
use crate::error::{ConfigError, TaskRunnerError};
use crate::runner::command::capture_command;
use crate::runner::context::Context;
use crate::runner::interpolate::{find_option_refs, interpolate};
use crate::runner::when::evaluate_when_list;
use crate::value::ValueType;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Explicit per-option inputs supplied to a task invocation, gathered by the
/// CLI dispatcher (flags actually passed) or by a caller's sub-task
/// argument map.
#[derive(Debug, Default, Clone)]
pub struct OptionInputs {
    /// Present only for options the user actually passed a flag for.
    pub flags: IndexMap<String, String>,
    /// Present only for options a parent task seeded via a sub-task call.
    pub parent_args: IndexMap<String, String>,
}

/// Resolve the full option scope for `task`, writing resolved values into
/// `ctx.vars` as they become available (so `when` and interpolation during
/// resolution itself can see earlier options).
pub fn resolve_task_scope(
    config: &Config,
    task: &TaskDef,
    inputs: &OptionInputs,
    ctx: &mut Context,
) -> Result<(), TaskRunnerError> {
    let order = compute_resolution_order(config, task)?;

    for name in order {
        let option = effective_option(config, task, &name)
            .expect("resolution order only contains declared options");
        let value = resolve_one_option(&name, option, inputs, ctx)?;
        ctx.set_var(name, value);
    }

    Ok(())
}

fn effective_option<'a>(config: &'a Config, task: &'a TaskDef, name: &str) -> Option<&'a OptionDef> {
    task.options.get(name).or_else(|| config.options.get(name))
}

/// Phase 1: shared options referenced (directly or transitively) by the
/// task, topologically sorted, followed by the task's own options,
/// topologically sorted among themselves.
pub fn compute_resolution_order(config: &Config, task: &TaskDef) -> Result<Vec<String>, TaskRunnerError> {
    let referenced_shared = referenced_shared_options(config, task);

    let shared_order = topological_order(&referenced_shared, |name| {
        config
            .options
            .get(name)
            .map(|opt| option_refs(opt).into_iter().filter(|r| referenced_shared.contains(r)).collect())
            .unwrap_or_default()
    })
    .map_err(ConfigError::CircularDependency)?;

    let own_names: Vec<String> = task.options.keys().cloned().collect();
    let own_universe: HashSet<String> = own_names.iter().cloned().collect();
    let own_order = topological_order(&own_names, |name| {
        task.options
            .get(name)
            .map(|opt| option_refs(opt).into_iter().filter(|r| own_universe.contains(r)).collect())
            .unwrap_or_default()
    })
    .map_err(ConfigError::CircularDependency)?;

    let mut order = shared_order;
    order.extend(own_order);
    Ok(order)
}

/// Shared option names textually referenced by the task (its own option
/// clauses and its run block), closed transitively over shared options'
/// own references.
fn referenced_shared_options(config: &Config, task: &TaskDef) -> Vec<String> {
    let mut refs: HashSet<String> = HashSet::new();

    for opt in task.options.values() {
        refs.extend(option_refs(opt));
    }
    for run_item in &task.run {
        refs.extend(run_item_refs(run_item));
    }

    // Close transitively: anything in refs that names a shared option may
    // itself reference further shared options.
    let mut frontier: Vec<String> = refs.iter().filter(|r| config.options.contains_key(*r)).cloned().collect();
    let mut result: HashSet<String> = frontier.iter().cloned().collect();

    while let Some(name) = frontier.pop() {
        if let Some(opt) = config.options.get(&name) {
            for r in option_refs(opt) {
                if config.options.contains_key(&r) && result.insert(r.clone()) {
                    frontier.push(r);
                }
            }
        }
    }

    // Preserve shared declaration order.
    config
        .options
        .keys()
        .filter(|k| result.contains(*k))
        .cloned()
        .collect()
}

fn option_refs(opt: &OptionDef) -> HashSet<String> {
    let mut refs = HashSet::new();
    for clause in &opt.default {
        for group in &clause.when {
            refs.extend(check_group_refs(group));
        }
        match &clause.producer {
            DefaultProducer::Value(v) => refs.extend(find_option_refs(v)),
            DefaultProducer::Command(c) => refs.extend(find_option_refs(c)),
        }
    }
    refs
}

fn run_item_refs(run_item: &crate::config::types::RunItem) -> HashSet<String> {
    use crate::config::types::RunAction;
    let mut refs = HashSet::new();
    for group in &run_item.when {
        refs.extend(check_group_refs(group));
    }
    match &run_item.action {
        RunAction::Command(cmds) => {
            for c in cmds {
                refs.extend(find_option_refs(c));
            }
        }
        RunAction::SetEnvironment(map) => {
            for v in map.values().flatten() {
                refs.extend(find_option_refs(v));
            }
        }
        RunAction::Task(call) => {
            for v in call.options.values() {
                refs.extend(find_option_refs(v));
            }
        }
    }
    refs
}

fn check_group_refs(group: &CheckGroup) -> HashSet<String> {
    let mut refs = HashSet::new();
    for list in [&group.command, &group.exists, &group.os].into_iter().flatten() {
        for item in list {
            refs.extend(find_option_refs(item));
        }
    }
    if let Some(env) = &group.environment {
        for v in env.values().flatten() {
            refs.extend(find_option_refs(v));
        }
    }
    for scalar_map in [&group.equal, &group.not_equal].into_iter().flatten() {
        for v in scalar_map.values() {
            refs.extend(find_option_refs(&v.as_canonical_string()));
        }
    }
    refs
}

/// Stable topological sort: iterate `names` in order, visiting each node's
/// dependencies (also in declaration order) before the node itself.
fn topological_order<F>(names: &[String], deps: F) -> Result<Vec<String>, String>
where
    F: Fn(&str) -> Vec<String>,
{
    #[derive(PartialEq, Clone, Copy)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    let mut marks: IndexMap<String, Mark> = names.iter().map(|n| (n.clone(), Mark::Unvisited)).collect();
    let mut order = Vec::with_capacity(names.len());

    fn visit<F>(
        name: &str,
        deps: &F,
        marks: &mut IndexMap<String, Mark>,
        order: &mut Vec<String>,
    ) -> Result<(), String>
    where
        F: Fn(&str) -> Vec<String>,
    {
        match marks.get(name).copied() {
            Some(Mark::Done) | None => return Ok(()),
            Some(Mark::Visiting) => return Err(name.to_string()),
            Some(Mark::Unvisited) => {}
        }
        marks.insert(name.to_string(), Mark::Visiting);
        for dep in deps(name) {
            visit(&dep, deps, marks, order)?;
        }
        marks.insert(name.to_string(), Mark::Done);
        order.push(name.to_string());
        Ok(())
    }

    for name in names {
        visit(name, &deps, &mut marks, &mut order)?;
    }

    Ok(order)
}

/// Resolve one option's value per the priority lattice; interpolates its
/// default clauses against the scope resolved so far.
fn resolve_one_option(
    name: &str,
    option: &OptionDef,
    inputs: &OptionInputs,
    ctx: &mut Context,
) -> Result<String, TaskRunnerError> {
    let value_type = ValueType::from_config_str(&option.option_type);

    if let Some(raw) = inputs.flags.get(name) {
        if !option.private {
            let canonical = value_type.canonicalize(name, raw)?;
            validate_allowed(name, &canonical, option)?;
            return Ok(canonical);
        }
    }

    if !option.private {
        if let Some(env_name) = &option.environment {
            if let Ok(raw) = std::env::var(env_name) {
                let canonical = value_type.canonicalize(name, &raw)?;
                validate_allowed(name, &canonical, option)?;
                return Ok(canonical);
            }
        }
    }

    if let Some(raw) = inputs.parent_args.get(name) {
        // Rule 3: an internal assignment from a caller; bypasses allowed-values.
        return value_type.canonicalize(name, raw);
    }

    for clause in &option.default {
        let guard_passes = if clause.when.is_empty() {
            true
        } else {
            evaluate_when_list(&clause.when, ctx)?
        };
        if !guard_passes {
            continue;
        }
        let raw = match &clause.producer {
            DefaultProducer::Value(v) => interpolate(v, &ctx.vars),
            DefaultProducer::Command(c) => {
                let cmd = interpolate(c, &ctx.vars);
                capture_command(&cmd, ctx)?
            }
        };
        return value_type.canonicalize(name, &raw);
    }

    if option.required {
        return Err(TaskRunnerError::MissingRequired(name.to_string()));
    }

    Ok(value_type.zero_value().to_string())
}

fn validate_allowed(name: &str, value: &str, option: &OptionDef) -> Result<(), TaskRunnerError> {
    if let Some(allowed) = &option.values {
        if !allowed.iter().any(|v| v == value) {
            return Err(TaskRunnerError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;

    fn config_from(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_priority_flag_beats_env_beats_default() {
        let config = config_from(
            r#"
tasks:
  greet:
    options:
      name:
        default: World
        environment: GREET_NAME
    run: echo hi
"#,
        );
        let task = &config.tasks["greet"];

        std::env::remove_var("GREET_NAME_TEST_PRI");

        let mut ctx = Context::new();
        let inputs = OptionInputs::default();
        resolve_task_scope(&config, task, &inputs, &mut ctx).unwrap();
        assert_eq!(ctx.get_var("name").unwrap(), "World");

        std::env::set_var("GREET_NAME", "Env");
        let mut ctx2 = Context::new();
        resolve_task_scope(&config, task, &inputs, &mut ctx2).unwrap();
        assert_eq!(ctx2.get_var("name").unwrap(), "Env");

        let mut flagged = OptionInputs::default();
        flagged.flags.insert("name".to_string(), "Flag".to_string());
        let mut ctx3 = Context::new();
        resolve_task_scope(&config, task, &flagged, &mut ctx3).unwrap();
        assert_eq!(ctx3.get_var("name").unwrap(), "Flag");

        std::env::remove_var("GREET_NAME");
    }

    #[test]
    fn test_conditional_default_by_os() {
        let config = config_from(
            r#"
tasks:
  greet:
    options:
      name:
        default:
          - when:
              os: definitely-not-the-real-os
            value: "Linux User"
          - value: "User"
    run: echo hi
"#,
        );
        let task = &config.tasks["greet"];
        let mut ctx = Context::new();
        resolve_task_scope(&config, task, &OptionInputs::default(), &mut ctx).unwrap();
        assert_eq!(ctx.get_var("name").unwrap(), "User");
    }

    #[test]
    fn test_default_clause_value_is_canonicalized() {
        let config = config_from(
            r#"
tasks:
  t:
    options:
      loud:
        type: bool
        default:
          - value: "True"
      retries:
        type: int
        default:
          - value: "007"
    run: echo hi
"#,
        );
        let task = &config.tasks["t"];
        let mut ctx = Context::new();
        resolve_task_scope(&config, task, &OptionInputs::default(), &mut ctx).unwrap();
        assert_eq!(ctx.get_var("loud").unwrap(), "true");
        assert_eq!(ctx.get_var("retries").unwrap(), "7");
    }

    #[test]
    fn test_required_without_value_fails() {
        let config = config_from(
            r#"
tasks:
  t:
    options:
      name:
        required: true
    run: echo hi
"#,
        );
        let task = &config.tasks["t"];
        let mut ctx = Context::new();
        let result = resolve_task_scope(&config, task, &OptionInputs::default(), &mut ctx);
        assert!(matches!(result, Err(TaskRunnerError::MissingRequired(_))));
    }

    #[test]
    fn test_zero_value_when_not_required() {
        let config = config_from(
            r#"
tasks:
  t:
    options:
      count:
        type: integer
    run: echo hi
"#,
        );
        let task = &config.tasks["t"];
        let mut ctx = Context::new();
        resolve_task_scope(&config, task, &OptionInputs::default(), &mut ctx).unwrap();
        assert_eq!(ctx.get_var("count").unwrap(), "0");
    }

    #[test]
    fn test_allowed_values_rejects_flag_but_not_default() {
        let config = config_from(
            r#"
tasks:
  t:
    options:
      number:
        values: [one, two, three]
        default: zero
    run: echo hi
"#,
        );
        let task = &config.tasks["t"];

        let mut ctx = Context::new();
        resolve_task_scope(&config, task, &OptionInputs::default(), &mut ctx).unwrap();
        assert_eq!(ctx.get_var("number").unwrap(), "zero");

        let mut bad = OptionInputs::default();
        bad.flags.insert("number".to_string(), "four".to_string());
        let mut ctx2 = Context::new();
        let result = resolve_task_scope(&config, task, &bad, &mut ctx2);
        assert!(matches!(result, Err(TaskRunnerError::InvalidValue { .. })));

        let mut good = OptionInputs::default();
        good.flags.insert("number".to_string(), "two".to_string());
        let mut ctx3 = Context::new();
        resolve_task_scope(&config, task, &good, &mut ctx3).unwrap();
        assert_eq!(ctx3.get_var("number").unwrap(), "two");
    }

    #[test]
    fn test_parent_arg_bypasses_allowed_values() {
        let config = config_from(
            r#"
tasks:
  t:
    options:
      number:
        values: [one, two]
    run: echo hi
"#,
        );
        let task = &config.tasks["t"];
        let mut inputs = OptionInputs::default();
        inputs.parent_args.insert("number".to_string(), "seventeen".to_string());
        let mut ctx = Context::new();
        resolve_task_scope(&config, task, &inputs, &mut ctx).unwrap();
        assert_eq!(ctx.get_var("number").unwrap(), "seventeen");
    }

    #[test]
    fn test_option_depends_on_another_resolves_after_it() {
        let config = config_from(
            r#"
tasks:
  t:
    options:
      base:
        default: hello
      greeting:
        default: "${base}, world"
    run: echo hi
"#,
        );
        let task = &config.tasks["t"];
        let order = compute_resolution_order(&config, task).unwrap();
        let base_pos = order.iter().position(|n| n == "base").unwrap();
        let greeting_pos = order.iter().position(|n| n == "greeting").unwrap();
        assert!(base_pos < greeting_pos);

        let mut ctx = Context::new();
        resolve_task_scope(&config, task, &OptionInputs::default(), &mut ctx).unwrap();
        assert_eq!(ctx.get_var("greeting").unwrap(), "hello, world");
    }

    #[test]
    fn test_cyclic_option_reference_is_rejected() {
        let config = config_from(
            r#"
tasks:
  t:
    options:
      a:
        default: "${b}"
      b:
        default: "${a}"
    run: echo hi
"#,
        );
        let task = &config.tasks["t"];
        let result = compute_resolution_order(&config, task);
        assert!(matches!(
            result,
            Err(TaskRunnerError::Config(ConfigError::CircularDependency(_)))
        ));
    }
}
