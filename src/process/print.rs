//! Process printing a constant value

use super::converter::{replace_in_value, Replacement, Replacements};
use super::error::{ProcessError, ProcessResult};
use serde_json::Value;

/// Prints a value: strings line by line, anything else as pretty JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintProcess {
    /// Printed value.
    pub value: Value,
}

impl PrintProcess {
    /// Print `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Lines printed by the process.
    pub fn lines(&self) -> Vec<String> {
        let text = match &self.value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        text.lines().map(str::to_string).collect()
    }

    pub(crate) fn smart_replace(&self, replacements: &Replacements) -> ProcessResult<Self> {
        let mut result = self.clone();
        for (name, replacement) in replacements {
            if name != "value" {
                return Err(ProcessError::Replacement {
                    process: "Print".to_string(),
                    field: name.clone(),
                });
            }
            result.value = match replacement {
                Replacement::Value(v) => v.clone(),
                Replacement::Nested(inner) | Replacement::Each(inner) => {
                    replace_in_value(result.value, inner, false)
                }
            };
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lines() {
        assert_eq!(PrintProcess::new("a\nb").lines(), vec!["a", "b"]);
        assert_eq!(
            PrintProcess::new(json!({"k": 1})).lines(),
            vec!["{", "  \"k\": 1", "}"]
        );
    }

    #[test]
    fn test_smart_replace() {
        let mut r = Replacements::new();
        r.insert("value".into(), Replacement::Value(json!("new")));
        assert_eq!(PrintProcess::new("old").smart_replace(&r).unwrap().value, json!("new"));

        let mut r = Replacements::new();
        r.insert("other".into(), Replacement::Value(json!("new")));
        assert!(PrintProcess::new("old").smart_replace(&r).is_err());
    }
}
