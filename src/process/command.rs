//! Shell-backed processes

use super::converter::{replace_in_value, Replacement, Replacements};
use super::error::{ProcessError, ProcessResult};
use super::template::Template;
use super::Process;
use crate::arguments::{
    ArgOptions, ArgumentPolicy, ArgumentResult, Declaration, ExposeArguments, FieldDescriptor,
    ProvidedValues, Schema,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Schema name of the base shell command.
pub const COMMAND_SCHEMA: &str = "Command";

/// Schema of the base shell command: one `cmd` field shown as `command`.
pub fn command_schema() -> Arc<Schema> {
    Arc::new(
        Schema::new(COMMAND_SCHEMA)
            .field(FieldDescriptor::new("cmd").args(ArgOptions::new().arg("command"))),
    )
}

/// A declaration rendered into a shell command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandProcess {
    /// Field values.
    pub declaration: Declaration,
    /// Command line template.
    pub template: Template,
    /// Nested processes, addressable from the template by name.
    pub nested: IndexMap<String, Process>,
}

impl CommandProcess {
    /// Create a command from a declaration and a template.
    ///
    /// Every placeholder must name a field of the declaration.
    pub fn new(declaration: Declaration, template: &str) -> ProcessResult<Self> {
        let template = Template::parse(template)?;
        let cmd = Self {
            declaration,
            template,
            nested: IndexMap::new(),
        };
        cmd.check_placeholders()?;
        Ok(cmd)
    }

    /// The base shell command.
    pub fn shell(cmd: ArgumentPolicy) -> ProcessResult<Self> {
        let declaration = Declaration::new(command_schema(), [("cmd", cmd)])?;
        Self::new(declaration, "{cmd:raw}")
    }

    /// Add a nested process whose command line can be used as `{name}`.
    pub fn with_nested(mut self, name: impl Into<String>, process: Process) -> Self {
        self.nested.insert(name.into(), process);
        self
    }

    fn check_placeholders(&self) -> ProcessResult<()> {
        for name in self.template.fields() {
            if !self.declaration.has_field(name) && !self.nested.contains_key(name) {
                return Err(ProcessError::template(
                    self.template.source(),
                    format!("unknown field '{}'", name),
                ));
            }
        }
        Ok(())
    }

    /// Whether this is the base shell command.
    pub fn is_shell(&self) -> bool {
        self.declaration.name() == COMMAND_SCHEMA
    }

    /// Render the command line.
    pub fn command_line(&self) -> ProcessResult<String> {
        self.template.render(&self.declaration, |name| {
            self.nested.get(name).map(|p| p.command_line())
        })
    }

    pub(crate) fn has_field(&self, name: &str) -> bool {
        self.declaration.has_field(name) || self.nested.contains_key(name)
    }

    pub(crate) fn with_arguments(&self, values: &ProvidedValues) -> ArgumentResult<Self> {
        let mut nested = IndexMap::with_capacity(self.nested.len());
        for (name, process) in &self.nested {
            nested.insert(name.clone(), process.with_arguments(values)?);
        }
        Ok(Self {
            declaration: self.declaration.with_arguments(values)?,
            template: self.template.clone(),
            nested,
        })
    }

    pub(crate) fn smart_replace(&self, replacements: &Replacements) -> ProcessResult<Self> {
        let mut result = self.clone();
        for (name, replacement) in replacements {
            if let Some(process) = self.nested.get(name) {
                let replaced = match replacement {
                    Replacement::Nested(inner) => process.smart_replace(inner)?,
                    Replacement::Each(inner) => process.replace_each(inner)?,
                    Replacement::Value(_) => {
                        return Err(ProcessError::Replacement {
                            process: self.to_string(),
                            field: name.clone(),
                        })
                    }
                };
                result.nested.insert(name.clone(), replaced);
                continue;
            }

            let current = match self.declaration.get(name) {
                Some(current) => current,
                None => {
                    return Err(ProcessError::Replacement {
                        process: self.to_string(),
                        field: name.clone(),
                    })
                }
            };
            let value = match replacement {
                Replacement::Value(value) => value.clone(),
                Replacement::Nested(inner) => {
                    let base = current.as_fixed().cloned().unwrap_or(Value::Null);
                    replace_in_value(base, inner, false)
                }
                Replacement::Each(inner) => match current.as_fixed() {
                    Some(Value::Array(items)) => Value::Array(
                        items
                            .iter()
                            .map(|item| replace_in_value(item.clone(), inner, true))
                            .collect(),
                    ),
                    _ => {
                        return Err(ProcessError::Replacement {
                            process: self.to_string(),
                            field: format!("{}[]", name),
                        })
                    }
                },
            };
            result.declaration = result
                .declaration
                .replace(name, ArgumentPolicy::Fixed(value))?;
        }
        Ok(result)
    }
}

impl std::fmt::Display for CommandProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_shell() {
            match self.declaration.get("cmd").and_then(|v| v.as_fixed()) {
                Some(Value::String(cmd)) => write!(f, "Command[{}]", cmd),
                Some(other) => write!(f, "Command[{}]", other),
                None => write!(f, "Command[...]"),
            }
        } else {
            write!(f, "{}", self.declaration)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{ValueKind, HOLE, OPTIONAL_ARGUMENT, REQUIRED_ARGUMENT};
    use serde_json::json;

    fn notify_schema() -> Arc<Schema> {
        Arc::new(
            Schema::new("Notify")
                .field(FieldDescriptor::new("body"))
                .field(FieldDescriptor::new("title").with_default(""))
                .field(FieldDescriptor::new("tags").with_default(json!([]))),
        )
    }

    #[test]
    fn test_shell_command_line() {
        let cmd = CommandProcess::shell("echo hello | wc -c".into()).unwrap();
        assert_eq!(cmd.command_line().unwrap(), "echo hello | wc -c");
        assert_eq!(cmd.to_string(), "Command[echo hello | wc -c]");
        assert!(cmd.is_shell());

        let hole = CommandProcess::shell(HOLE).unwrap();
        assert_eq!(hole.to_string(), "Command[...]");
        assert!(hole.command_line().is_err());
    }

    #[test]
    fn test_unknown_placeholder_is_rejected() {
        let decl = Declaration::new(notify_schema(), [("body", REQUIRED_ARGUMENT)]).unwrap();
        assert!(CommandProcess::new(decl, "notify-send {colour}").is_err());
    }

    #[test]
    fn test_templated_command() {
        let decl = Declaration::new(
            notify_schema(),
            [("body", "it's done".into()), ("title", OPTIONAL_ARGUMENT)],
        )
        .unwrap();
        let cmd = CommandProcess::new(decl, "notify-send {title} {body}").unwrap();
        assert_eq!(cmd.command_line().unwrap(), "notify-send '' 'it'\\''s done'");
        assert_eq!(cmd.to_string(), "Notify");
    }

    #[test]
    fn test_nested_command_line() {
        let schema = Arc::new(
            Schema::new("Kitty").field(
                FieldDescriptor::new("width")
                    .with_default(80)
                    .kind(ValueKind::Integer),
            ),
        );
        let decl = Declaration::new(schema, Vec::<(&str, ArgumentPolicy)>::new()).unwrap();
        let inner = Process::command("htop");
        let cmd = CommandProcess::new(decl.clone(), "kitty --width {width} {cmd:raw}");
        assert!(cmd.is_err());

        let mut cmd = CommandProcess {
            declaration: decl,
            template: Template::parse("kitty --width {width} sh -c {cmd}").unwrap(),
            nested: IndexMap::new(),
        };
        cmd = cmd.with_nested("cmd", inner);
        assert_eq!(cmd.command_line().unwrap(), "kitty --width 80 sh -c htop");
    }

    #[test]
    fn test_smart_replace() {
        let decl = Declaration::new(
            notify_schema(),
            [
                ("body", HOLE),
                ("tags", json!([{"name": "a", "level": 1}, {"name": "b"}]).into()),
            ],
        )
        .unwrap();
        let cmd = CommandProcess::new(decl, "notify-send {body}").unwrap();

        let mut replacements = Replacements::new();
        replacements.insert("body".into(), Replacement::Value(json!("filled")));
        let mut each = Replacements::new();
        each.insert("level".into(), Replacement::Value(json!(5)));
        replacements.insert("tags".into(), Replacement::Each(each));

        let replaced = cmd.smart_replace(&replacements).unwrap();
        assert_eq!(replaced.command_line().unwrap(), "notify-send filled");
        assert_eq!(
            replaced.declaration.get("tags").unwrap().as_fixed(),
            Some(&json!([{"name": "a", "level": 5}, {"name": "b"}]))
        );

        let mut unknown = Replacements::new();
        unknown.insert("colour".into(), Replacement::Value(json!("red")));
        assert!(matches!(
            cmd.smart_replace(&unknown),
            Err(ProcessError::Replacement { .. })
        ));
    }
}
