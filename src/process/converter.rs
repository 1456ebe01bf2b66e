//! Stdin converters and field replacements

use super::error::{ProcessError, ProcessResult};
use super::Process;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Replacements keyed by field name.
pub type Replacements = IndexMap<String, Replacement>;

/// New content for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// Concrete value.
    Value(Value),
    /// Replacements applied inside a nested process or object.
    Nested(Replacements),
    /// Replacements applied to every element of a list, keeping only the
    /// keys each element has.
    Each(Replacements),
}

impl Replacement {
    /// Build replacements from a JSON object.
    ///
    /// Object values become `Nested`, keys ending in `[]` become `Each`.
    pub fn from_json(object: &serde_json::Map<String, Value>) -> Replacements {
        let mut replacements = Replacements::new();
        for (key, value) in object {
            match (key.strip_suffix("[]"), value) {
                (Some(name), Value::Object(inner)) => {
                    replacements.insert(name.to_string(), Replacement::Each(Self::from_json(inner)));
                }
                (None, Value::Object(inner)) => {
                    replacements.insert(key.clone(), Replacement::Nested(Self::from_json(inner)));
                }
                _ => {
                    replacements.insert(key.clone(), Replacement::Value(value.clone()));
                }
            }
        }
        replacements
    }
}

/// Apply replacements to a JSON object. With `existing_only`, keys the
/// object does not have are dropped.
pub(crate) fn replace_in_value(base: Value, replacements: &Replacements, existing_only: bool) -> Value {
    let mut object = match base {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    for (key, replacement) in replacements {
        if existing_only && !object.contains_key(key) {
            continue;
        }
        let current = object.remove(key).unwrap_or(Value::Null);
        let value = match replacement {
            Replacement::Value(v) => v.clone(),
            Replacement::Nested(inner) => replace_in_value(current, inner, false),
            Replacement::Each(inner) => match current {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .map(|item| replace_in_value(item, inner, true))
                        .collect(),
                ),
                other => other,
            },
        };
        object.insert(key.clone(), value);
    }
    Value::Object(object)
}

/// Custom conversion function.
pub type ConvertFn = Arc<dyn Fn(&str) -> ProcessResult<Replacements> + Send + Sync>;

/// Transformation from the complete previous output to field replacements.
#[derive(Clone)]
pub enum Converter {
    /// First line of the output into `field`.
    FirstLine {
        /// Target field.
        field: String,
    },
    /// Whole output into `field`.
    Output {
        /// Target field.
        field: String,
    },
    /// Output lines, as a list, into `field`.
    Lines {
        /// Target field.
        field: String,
    },
    /// Output parsed as a JSON object of replacements.
    Json,
    /// Any function.
    Custom(ConvertFn),
}

impl Converter {
    /// Wrap a function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> ProcessResult<Replacements> + Send + Sync + 'static,
    {
        Converter::Custom(Arc::new(f))
    }

    /// Compute the replacements for an output.
    pub fn convert(&self, output: &str) -> ProcessResult<Replacements> {
        let single = |field: &str, value: Value| {
            let mut r = Replacements::new();
            r.insert(field.to_string(), Replacement::Value(value));
            r
        };

        match self {
            Converter::FirstLine { field } => {
                let line = output.lines().next().unwrap_or_default();
                Ok(single(field, Value::String(line.to_string())))
            }
            Converter::Output { field } => Ok(single(field, Value::String(output.to_string()))),
            Converter::Lines { field } => Ok(single(
                field,
                Value::Array(output.lines().map(|l| Value::String(l.to_string())).collect()),
            )),
            Converter::Json => match serde_json::from_str::<Value>(output) {
                Ok(Value::Object(map)) => Ok(Replacement::from_json(&map)),
                Ok(_) => Err(ProcessError::converter("expected a JSON object")),
                Err(e) => Err(ProcessError::converter(e.to_string())),
            },
            Converter::Custom(f) => f(output),
        }
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Converter::FirstLine { field } => write!(f, "FirstLine({})", field),
            Converter::Output { field } => write!(f, "Output({})", field),
            Converter::Lines { field } => write!(f, "Lines({})", field),
            Converter::Json => write!(f, "Json"),
            Converter::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Converter::FirstLine { field: a }, Converter::FirstLine { field: b })
            | (Converter::Output { field: a }, Converter::Output { field: b })
            | (Converter::Lines { field: a }, Converter::Lines { field: b }) => a == b,
            (Converter::Json, Converter::Json) => true,
            (Converter::Custom(a), Converter::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Runs its target with fields filled from the previous output.
#[derive(Debug, Clone, PartialEq)]
pub struct StdinConverter {
    /// Process run once the replacements are applied.
    pub target: Box<Process>,
    /// Output to replacements.
    pub converter: Converter,
}

impl StdinConverter {
    /// Wrap a target.
    pub fn new(target: Process, converter: Converter) -> Self {
        Self {
            target: Box::new(target),
            converter,
        }
    }

    /// Target with the replacements computed from `output`.
    pub fn prepare(&self, output: &str) -> ProcessResult<Process> {
        let replacements = self.converter.convert(output)?;
        self.target.smart_replace(&replacements)
    }
}
