//! Variable interpolation for strings
//!
//! This module handles parsing and replacing `${name}` variables in raw
//! configuration text, plus the `$$` escape that lets a literal `${...}`
//! survive into the executed command or comparison untouched.

use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Private-use-area stand-in for an escaped `$`, used only internally so the
/// token regex below never matches across an escape boundary.
const ESCAPE_SENTINEL: char = '\u{E000}';

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap())
}

/// Replace every `$$` with the escape sentinel so the token regex can't
/// mistake the brace that follows for the start of an interpolation.
fn mask_escapes(s: &str) -> String {
    s.replace("$$", &ESCAPE_SENTINEL.to_string())
}

/// Collapse the escape sentinel back down to a single literal `$`.
fn finalize_escapes(s: &str) -> String {
    s.replace(ESCAPE_SENTINEL, "$")
}

/// Replace `${name}` with `vars[name]` wherever `name` is known; anything
/// else (an undeclared name, a bare `$VAR`) is left untouched.
fn substitute_known(s: &str, vars: &IndexMap<String, String>) -> String {
    token_regex()
        .replace_all(s, |caps: &regex::Captures| {
            let name = &caps[1];
            match vars.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Interpolate a single piece of raw configuration text against the
/// currently-resolved option scope.
///
/// Each piece of text passes through here exactly once, at the point it is
/// actually consumed (a command about to run, a `when` check about to be
/// evaluated, a default clause about to be chosen) — resolution order
/// (`runner::resolve`) guarantees every name the text can legally reference
/// is already in `vars` by then.
pub fn interpolate(s: &str, vars: &IndexMap<String, String>) -> String {
    let masked = mask_escapes(s);
    let substituted = substitute_known(&masked, vars);
    finalize_escapes(&substituted)
}

/// Interpolate every value in a map (used for `set-environment` payloads
/// and sub-task argument maps).
pub fn interpolate_map(
    map: &IndexMap<String, String>,
    vars: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), interpolate(v, vars)))
        .collect()
}

/// Scan raw configuration text for every `${name}` reference, ignoring
/// anything masked out by a `$$` escape. Used by the option resolver to
/// build the dependency graph for topological ordering.
pub fn find_option_refs(s: &str) -> HashSet<String> {
    let masked = mask_escapes(s);
    token_regex()
        .captures_iter(&masked)
        .map(|caps| caps[1].to_string())
        .collect()
}
