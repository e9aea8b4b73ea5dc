//! Typed option values and their canonical string form.
//!
//! Options are declared with a type but always exchanged as strings once
//! resolved — `ValueType` is the bridge: it parses a raw textual form
//! (from a flag or an environment variable) and produces the canonical
//! string stored in an option scope.

use crate::error::TaskRunnerError;

/// The declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ValueType {
    /// Parse the `type:` field of an option declaration (defaults to string
    /// for anything unrecognized; schema validation rejects unknown types
    /// before this is ever reached).
    pub fn from_config_str(s: &str) -> Self {
        match s {
            "bool" | "boolean" => ValueType::Boolean,
            "int" | "integer" => ValueType::Integer,
            "float" => ValueType::Float,
            _ => ValueType::String,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
        }
    }

    /// The value used when an option is unresolved and has no default.
    pub fn zero_value(self) -> &'static str {
        match self {
            ValueType::String => "",
            ValueType::Integer => "0",
            ValueType::Float => "0",
            ValueType::Boolean => "false",
        }
    }

    /// Parse `raw` as this type and return its canonical string form.
    ///
    /// Booleans canonicalize to exactly `true`/`false` (lowercase); ints and
    /// floats round-trip through their native parse/format so that `"1.50"`
    /// and `"1.5"` agree on one canonical spelling.
    pub fn canonicalize(self, option_name: &str, raw: &str) -> Result<String, TaskRunnerError> {
        let err = || TaskRunnerError::TypeError {
            name: option_name.to_string(),
            expected: self.name(),
            value: raw.to_string(),
        };
        match self {
            ValueType::String => Ok(raw.to_string()),
            ValueType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok("true".to_string()),
                "false" => Ok("false".to_string()),
                _ => Err(err()),
            },
            ValueType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(|v| v.to_string())
                .map_err(|_| err()),
            ValueType::Float => raw
                .trim()
                .parse::<f64>()
                .map(|v| v.to_string())
                .map_err(|_| err()),
        }
    }
}
