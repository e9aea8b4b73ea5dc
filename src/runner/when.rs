//! `when` predicate evaluation
//!
//! A `when` guard is a list of check-groups (AND across the list); within
//! one check-group every declared key must pass (AND across keys), and a
//! key's own string-or-list value passes if any entry matches (OR).

use crate::config::types::CheckGroup;
use crate::error::{ConfigError, TaskRunnerError};
use crate::runner::command::check_command;
use crate::runner::context::Context;
use crate::runner::interpolate::interpolate;

/// Evaluate an ordered list of check-groups; vacuously true if empty.
pub fn evaluate_when_list(
    when_list: &[CheckGroup],
    ctx: &Context,
) -> Result<bool, TaskRunnerError> {
    for group in when_list {
        if !evaluate_check_group(group, ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Evaluate a single check-group: every present key must pass.
pub fn evaluate_check_group(group: &CheckGroup, ctx: &Context) -> Result<bool, TaskRunnerError> {
    if let Some(commands) = &group.command {
        let mut any_ok = false;
        for c in commands {
            let cmd = interpolate(c, &ctx.vars);
            if check_command(&cmd, ctx)? {
                any_ok = true;
                break;
            }
        }
        if !any_ok {
            return Ok(false);
        }
    }

    if let Some(paths) = &group.exists {
        let ok = paths.iter().any(|p| {
            let path = interpolate(p, &ctx.vars);
            ctx.config_dir().join(&path).exists() || std::path::Path::new(&path).exists()
        });
        if !ok {
            return Ok(false);
        }
    }

    if let Some(oses) = &group.os {
        let host_os = std::env::consts::OS;
        if !oses.iter().any(|o| o == host_os) {
            return Ok(false);
        }
    }

    if let Some(env_checks) = &group.environment {
        for (name, expected) in env_checks {
            let actual = std::env::var(name).ok();
            let expected = expected.as_ref().map(|v| interpolate(v, &ctx.vars));
            if actual != expected {
                return Ok(false);
            }
        }
    }

    if let Some(equal_checks) = &group.equal {
        for (name, scalar) in equal_checks {
            let actual = lookup_option(ctx, name)?;
            if actual != scalar.as_canonical_string() {
                return Ok(false);
            }
        }
    }

    if let Some(not_equal_checks) = &group.not_equal {
        for (name, scalar) in not_equal_checks {
            let actual = lookup_option(ctx, name)?;
            if actual == scalar.as_canonical_string() {
                return Ok(false);
            }
        }
    }

    Ok(true)
}

fn lookup_option(ctx: &Context, name: &str) -> Result<String, TaskRunnerError> {
    ctx.get_var(name)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownOption(name.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn group() -> CheckGroup {
        CheckGroup {
            command: None,
            exists: None,
            os: None,
            environment: None,
            equal: None,
            not_equal: None,
        }
    }

    #[test]
    fn test_empty_group_passes() {
        let ctx = Context::new();
        assert!(evaluate_check_group(&group(), &ctx).unwrap());
    }

    #[test]
    fn test_empty_when_list_is_vacuously_true() {
        let ctx = Context::new();
        assert!(evaluate_when_list(&[], &ctx).unwrap());
    }

    #[test]
    fn test_equal_true_and_false() {
        let mut vars = IndexMap::new();
        vars.insert("env".to_string(), "production".to_string());
        let ctx = Context::new().with_vars(vars);

        let mut g = group();
        let mut equal = indexmap::IndexMap::new();
        equal.insert(
            "env".to_string(),
            crate::config::types::Scalar::String("production".to_string()),
        );
        g.equal = Some(equal);
        assert!(evaluate_check_group(&g, &ctx).unwrap());

        let mut g2 = group();
        let mut equal2 = indexmap::IndexMap::new();
        equal2.insert(
            "env".to_string(),
            crate::config::types::Scalar::String("development".to_string()),
        );
        g2.equal = Some(equal2);
        assert!(!evaluate_check_group(&g2, &ctx).unwrap());
    }

    #[test]
    fn test_equal_unknown_option_errors() {
        let ctx = Context::new();
        let mut g = group();
        let mut equal = indexmap::IndexMap::new();
        equal.insert(
            "nope".to_string(),
            crate::config::types::Scalar::String("x".to_string()),
        );
        g.equal = Some(equal);
        let result = evaluate_check_group(&g, &ctx);
        assert!(matches!(
            result,
            Err(TaskRunnerError::Config(ConfigError::UnknownOption(_)))
        ));
    }

    #[test]
    fn test_not_equal() {
        let mut vars = IndexMap::new();
        vars.insert("env".to_string(), "development".to_string());
        let ctx = Context::new().with_vars(vars);

        let mut g = group();
        let mut not_equal = indexmap::IndexMap::new();
        not_equal.insert(
            "env".to_string(),
            crate::config::types::Scalar::String("production".to_string()),
        );
        g.not_equal = Some(not_equal);
        assert!(evaluate_check_group(&g, &ctx).unwrap());
    }

    #[test]
    fn test_command_check() {
        let ctx = Context::new();

        let mut g = group();
        g.command = Some(vec!["true".to_string()]);
        assert!(evaluate_check_group(&g, &ctx).unwrap());

        let mut g2 = group();
        g2.command = Some(vec!["false".to_string()]);
        assert!(!evaluate_check_group(&g2, &ctx).unwrap());
    }

    #[test]
    fn test_command_list_is_or() {
        let ctx = Context::new();
        let mut g = group();
        g.command = Some(vec!["false".to_string(), "true".to_string()]);
        assert!(evaluate_check_group(&g, &ctx).unwrap());
    }

    #[test]
    fn test_exists() {
        use tempfile::TempDir;
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("test.txt"), "hi").unwrap();

        let ctx = Context::new().with_working_dir(temp_dir.path().to_path_buf());
        let mut g = group();
        g.exists = Some(vec![temp_dir.path().join("test.txt").display().to_string()]);
        assert!(evaluate_check_group(&g, &ctx).unwrap());

        let mut g2 = group();
        g2.exists = Some(vec!["definitely-not-there.txt".to_string()]);
        assert!(!evaluate_check_group(&g2, &ctx).unwrap());
    }

    #[test]
    fn test_os_match() {
        let ctx = Context::new();
        let mut g = group();
        g.os = Some(vec![std::env::consts::OS.to_string()]);
        assert!(evaluate_check_group(&g, &ctx).unwrap());

        let mut g2 = group();
        g2.os = Some(vec!["definitely-not-an-os".to_string()]);
        assert!(!evaluate_check_group(&g2, &ctx).unwrap());
    }

    #[test]
    fn test_environment_null_means_unset() {
        std::env::remove_var("TUSK_WHEN_TEST_VAR");
        let ctx = Context::new();
        let mut g = group();
        let mut env_map = indexmap::IndexMap::new();
        env_map.insert("TUSK_WHEN_TEST_VAR".to_string(), None);
        g.environment = Some(env_map);
        assert!(evaluate_check_group(&g, &ctx).unwrap());
    }

    #[test]
    fn test_when_list_is_and_across_groups() {
        let mut vars = IndexMap::new();
        vars.insert("env".to_string(), "production".to_string());
        let ctx = Context::new().with_vars(vars);

        let mut equal_group = group();
        let mut equal = indexmap::IndexMap::new();
        equal.insert(
            "env".to_string(),
            crate::config::types::Scalar::String("production".to_string()),
        );
        equal_group.equal = Some(equal);

        let mut command_group = group();
        command_group.command = Some(vec!["true".to_string()]);

        assert!(evaluate_when_list(&[equal_group.clone(), command_group], &ctx).unwrap());

        let mut failing_command_group = group();
        failing_command_group.command = Some(vec!["false".to_string()]);
        assert!(!evaluate_when_list(&[equal_group, failing_command_group], &ctx).unwrap());
    }
}
