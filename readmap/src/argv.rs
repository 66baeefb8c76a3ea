use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single option value handed to the index on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Booleans print capitalised (`True`/`False`) when they appear as values,
/// which is how index engines spell them on their command lines.
impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(true) => f.write_str("True"),
            ArgValue::Bool(false) => f.write_str("False"),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        ArgValue::Int(i)
    }
}

impl From<i32> for ArgValue {
    fn from(i: i32) -> Self {
        ArgValue::Int(i as i64)
    }
}

impl From<u32> for ArgValue {
    fn from(i: u32) -> Self {
        ArgValue::Int(i as i64)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

/// Turn an option name such as `small_window` into `--small-window`.
pub fn long_flag(name: &str) -> String {
    format!("--{}", name.replace('_', "-"))
}

/// Build an argv-style list (without program name) from named options and
/// positional values.
///
/// `true` emits the bare flag, `false` drops it, anything else emits the flag
/// followed by the value. Options keep the map's insertion order and positional
/// values are appended last. Nothing is validated here.
pub fn to_argv(options: &IndexMap<String, ArgValue>, positional: &[ArgValue]) -> Vec<String> {
    let mut argv = Vec::with_capacity(options.len() * 2 + positional.len());
    for (name, value) in options {
        match value {
            ArgValue::Bool(true) => argv.push(long_flag(name)),
            ArgValue::Bool(false) => {}
            other => {
                argv.push(long_flag(name));
                argv.push(other.to_string());
            }
        }
    }
    argv.extend(positional.iter().map(|x| x.to_string()));
    argv
}
