//! Core configuration types
//!
//! This module defines the data structures that represent a tusk.yml configuration file.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application name (optional)
    #[serde(default)]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default)]
    pub usage: Option<String>,

    /// Options shared across every task, in declaration order
    #[serde(default)]
    pub options: IndexMap<String, OptionDef>,

    /// Tasks defined in the configuration, in declaration order
    #[serde(default)]
    pub tasks: IndexMap<String, TaskDef>,

    /// Global interpreter to use for commands (e.g., ["bash", "-c"])
    #[serde(default)]
    pub interpreter: Option<Vec<String>>,
}

/// A task definition
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDef {
    /// Usage description for help text
    #[serde(default)]
    pub usage: Option<String>,

    /// Longer description for help text
    #[serde(default)]
    pub description: Option<String>,

    /// Whether this task is hidden from the command-line surface
    #[serde(default)]
    pub private: bool,

    /// Named options for this task, in declaration order
    #[serde(default)]
    pub options: IndexMap<String, OptionDef>,

    /// The run program
    #[serde(default, deserialize_with = "deserialize_run_items")]
    pub run: Vec<RunItem>,
}

/// An option (flag) definition, declared either at the configuration root
/// (shared) or on a single task.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionDef {
    /// Usage description for help text
    #[serde(default)]
    pub usage: Option<String>,

    /// Short flag (single character)
    #[serde(default)]
    pub short: Option<char>,

    /// Option type (string, bool, integer, float)
    #[serde(rename = "type", default = "default_option_type")]
    pub option_type: String,

    /// Ordered default clauses, evaluated first-match
    #[serde(default, deserialize_with = "deserialize_default_list")]
    pub default: Vec<DefaultClause>,

    /// Required option: fails if unresolved by flag/env/parent-arg/default
    #[serde(default)]
    pub required: bool,

    /// Allowed values, checked only against flag- or env-sourced input
    #[serde(default)]
    pub values: Option<Vec<String>>,

    /// Environment variable this option reads from
    #[serde(default)]
    pub environment: Option<String>,

    /// Private option: not reachable from flags or the environment
    #[serde(default)]
    pub private: bool,
}

fn default_option_type() -> String {
    "string".to_string()
}

/// A single entry of an option's default-list: an optional guard plus
/// exactly one producer (a literal value or a command to run for its stdout).
#[derive(Debug, Clone)]
pub struct DefaultClause {
    pub when: Vec<CheckGroup>,
    pub producer: DefaultProducer,
}

#[derive(Debug, Clone)]
pub enum DefaultProducer {
    Value(String),
    Command(String),
}

impl<'de> Deserialize<'de> for DefaultClause {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) => Ok(DefaultClause {
                when: Vec::new(),
                producer: DefaultProducer::Value(s),
            }),
            Value::Mapping(map) => {
                let when = match map.get(Value::String("when".to_string())) {
                    Some(v) => parse_when_value(v.clone()).map_err(DeError::custom)?,
                    None => Vec::new(),
                };
                let value_field = map.get(Value::String("value".to_string()));
                let command_field = map.get(Value::String("command".to_string()));
                let producer = match (value_field, command_field) {
                    (Some(v), None) => {
                        DefaultProducer::Value(scalar_value_to_string(v).map_err(DeError::custom)?)
                    }
                    (None, Some(c)) => {
                        DefaultProducer::Command(scalar_value_to_string(c).map_err(DeError::custom)?)
                    }
                    (None, None) => {
                        return Err(DeError::custom(
                            "default clause must have exactly one of 'value' or 'command'",
                        ))
                    }
                    (Some(_), Some(_)) => {
                        return Err(DeError::custom(
                            "default clause cannot have both 'value' and 'command'",
                        ))
                    }
                };
                Ok(DefaultClause { when, producer })
            }
            _ => Err(DeError::custom(
                "default clause must be a string or a mapping",
            )),
        }
    }
}

fn scalar_value_to_string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err("expected a scalar value".to_string()),
    }
}

fn deserialize_default_list<'de, D>(deserializer: D) -> Result<Vec<DefaultClause>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| DefaultClause::deserialize(item).map_err(D::Error::custom))
            .collect(),
        other => DefaultClause::deserialize(other)
            .map(|clause| vec![clause])
            .map_err(D::Error::custom),
    }
}

/// One guarded, tagged action plus its `when` condition.
#[derive(Debug, Clone)]
pub struct RunItem {
    pub when: Vec<CheckGroup>,
    pub action: RunAction,
}

#[derive(Debug, Clone)]
pub enum RunAction {
    Command(Vec<String>),
    SetEnvironment(IndexMap<String, Option<String>>),
    Task(SubTaskCall),
}

/// A reference to a sub-task invocation: target name plus argument values
/// seeded straight into the sub-task's option scope.
#[derive(Debug, Clone)]
pub struct SubTaskCall {
    pub name: String,
    pub options: IndexMap<String, String>,
}

impl<'de> Deserialize<'de> for RunItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) => Ok(RunItem {
                when: Vec::new(),
                action: RunAction::Command(vec![s]),
            }),
            Value::Mapping(map) => {
                let when = match map.get(Value::String("when".to_string())) {
                    Some(v) => parse_when_value(v.clone()).map_err(DeError::custom)?,
                    None => Vec::new(),
                };

                let command = map.get(Value::String("command".to_string()));
                let set_env = map.get(Value::String("set-environment".to_string()));
                let task = map.get(Value::String("task".to_string()));

                let present = [command.is_some(), set_env.is_some(), task.is_some()]
                    .iter()
                    .filter(|x| **x)
                    .count();
                if present > 1 {
                    return Err(DeError::custom(
                        "run item has more than one action (command, set-environment, task)",
                    ));
                }
                if present == 0 {
                    return Err(DeError::custom(
                        "run item must declare exactly one of command, set-environment, task",
                    ));
                }

                let action = if let Some(c) = command {
                    RunAction::Command(parse_string_or_list(c.clone()).map_err(DeError::custom)?)
                } else if let Some(e) = set_env {
                    RunAction::SetEnvironment(parse_env_map(e.clone()).map_err(DeError::custom)?)
                } else {
                    let t = task.unwrap();
                    RunAction::Task(parse_subtask(t.clone()).map_err(DeError::custom)?)
                };

                Ok(RunItem { when, action })
            }
            _ => Err(DeError::custom("run item must be a string or a mapping")),
        }
    }
}

fn parse_subtask(value: Value) -> Result<SubTaskCall, String> {
    match value {
        Value::String(s) => Ok(SubTaskCall {
            name: s,
            options: IndexMap::new(),
        }),
        Value::Mapping(map) => {
            let name = match map.get(Value::String("name".to_string())) {
                Some(Value::String(s)) => s.clone(),
                _ => return Err("sub-task reference requires a 'name'".to_string()),
            };
            let mut options = IndexMap::new();
            if let Some(Value::Mapping(opt_map)) = map.get(Value::String("options".to_string())) {
                for (k, v) in opt_map {
                    let key = k
                        .as_str()
                        .ok_or_else(|| "sub-task option names must be strings".to_string())?
                        .to_string();
                    let value = scalar_value_to_string(v)?;
                    options.insert(key, value);
                }
            }
            Ok(SubTaskCall { name, options })
        }
        _ => Err("sub-task reference must be a string or a mapping".to_string()),
    }
}

fn parse_env_map(value: Value) -> Result<IndexMap<String, Option<String>>, String> {
    let Value::Mapping(map) = value else {
        return Err("set-environment must be a mapping".to_string());
    };
    let mut out = IndexMap::new();
    for (k, v) in map {
        let key = k
            .as_str()
            .ok_or_else(|| "set-environment keys must be strings".to_string())?
            .to_string();
        let value = match v {
            Value::Null => None,
            other => Some(scalar_value_to_string(&other)?),
        };
        out.insert(key, value);
    }
    Ok(out)
}

fn parse_string_or_list(value: Value) -> Result<Vec<String>, String> {
    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err("expected a string entry".to_string()),
            })
            .collect(),
        _ => Err("expected a string or a list of strings".to_string()),
    }
}

fn deserialize_run_items<'de, D>(deserializer: D) -> Result<Vec<RunItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| RunItem::deserialize(item).map_err(D::Error::custom))
            .collect(),
        other => RunItem::deserialize(other)
            .map(|item| vec![item])
            .map_err(D::Error::custom),
    }
}

/// A single `when` check-group: every declared key must pass (AND); a
/// key's own string-or-list value passes if any entry matches (OR).
#[derive(Debug, Clone, Default)]
pub struct CheckGroup {
    pub command: Option<Vec<String>>,
    pub exists: Option<Vec<String>>,
    pub os: Option<Vec<String>>,
    pub environment: Option<IndexMap<String, Option<String>>>,
    pub equal: Option<IndexMap<String, Scalar>>,
    pub not_equal: Option<IndexMap<String, Scalar>>,
}

impl<'de> Deserialize<'de> for CheckGroup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        parse_check_group(value).map_err(DeError::custom)
    }
}

fn parse_check_group(value: Value) -> Result<CheckGroup, String> {
    let Value::Mapping(map) = value else {
        return Err("a when check-group must be a mapping".to_string());
    };
    let mut group = CheckGroup::default();

    if let Some(v) = map.get(Value::String("command".to_string())) {
        group.command = Some(parse_string_or_list(v.clone())?);
    }
    if let Some(v) = map.get(Value::String("exists".to_string())) {
        group.exists = Some(parse_string_or_list(v.clone())?);
    }
    if let Some(v) = map.get(Value::String("os".to_string())) {
        group.os = Some(parse_string_or_list(v.clone())?);
    }
    if let Some(v) = map.get(Value::String("environment".to_string())) {
        group.environment = Some(parse_env_map(v.clone())?);
    }
    if let Some(v) = map.get(Value::String("equal".to_string())) {
        group.equal = Some(parse_scalar_map(v.clone())?);
    }
    if let Some(v) = map.get(Value::String("not-equal".to_string())) {
        group.not_equal = Some(parse_scalar_map(v.clone())?);
    }

    Ok(group)
}

fn parse_scalar_map(value: Value) -> Result<IndexMap<String, Scalar>, String> {
    let Value::Mapping(map) = value else {
        return Err("expected a mapping of option name to value".to_string());
    };
    let mut out = IndexMap::new();
    for (k, v) in map {
        let key = k
            .as_str()
            .ok_or_else(|| "option names must be strings".to_string())?
            .to_string();
        out.insert(key, Scalar::from_value(v)?);
    }
    Ok(out)
}

fn parse_when_value(value: Value) -> Result<Vec<CheckGroup>, String> {
    match value {
        Value::Sequence(seq) => seq.into_iter().map(parse_check_group).collect(),
        mapping @ Value::Mapping(_) => parse_check_group(mapping).map(|g| vec![g]),
        Value::Null => Ok(Vec::new()),
        _ => Err("when must be a mapping or a list of mappings".to_string()),
    }
}

/// A scalar comparison operand in `equal`/`not-equal`: canonicalized to a
/// string the same way a resolved option value would be.
#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(Scalar::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Scalar::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Scalar::Float(f))
                } else {
                    Err("unsupported numeric literal".to_string())
                }
            }
            Value::String(s) => Ok(Scalar::String(s)),
            _ => Err("expected a scalar (string, bool, or number)".to_string()),
        }
    }

    pub fn as_canonical_string(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }
}
