//! Registrable plugin objects

use super::error::{PluginError, PluginResult};
use crate::arguments::{ArgumentPolicy, Declaration, Schema};
use crate::process::{CommandProcess, Process};
use crate::tree::TreeItem;
use std::sync::Arc;

/// A declaration type a plugin provides: its schema and, when it can run,
/// its command template.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandClass {
    /// Field schema; its name is the class name.
    pub schema: Arc<Schema>,
    /// Command line template over the schema fields.
    pub template: Option<String>,
    /// One-line description.
    pub description: Option<String>,
}

impl CommandClass {
    /// A class without template.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            template: None,
            description: None,
        }
    }

    /// Set the command template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Whether instances of the class can be run.
    pub fn is_runnable(&self) -> bool {
        self.template.is_some()
    }

    /// Create a process from field values.
    pub fn instantiate<I, K>(&self, values: I) -> PluginResult<Process>
    where
        I: IntoIterator<Item = (K, ArgumentPolicy)>,
        K: Into<String>,
    {
        let template = self
            .template
            .as_deref()
            .ok_or_else(|| PluginError::NotRunnable(self.name().to_string()))?;
        let declaration = Declaration::new(Arc::clone(&self.schema), values)?;
        Ok(Process::Command(CommandProcess::new(declaration, template)?))
    }
}

/// A command class registered by a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCommand {
    /// Registered class.
    pub class: CommandClass,
    /// Leaf name, the class name unless given.
    pub name: String,
    /// Dotted group path.
    pub export_path: String,
    /// Module the class comes from.
    pub module: String,
}

impl ExternalCommand {
    /// Register `class` under its own name.
    pub fn new(class: CommandClass) -> Self {
        Self {
            name: class.name().to_string(),
            class,
            export_path: String::new(),
            module: String::new(),
        }
    }

    /// Rename the leaf. An empty name keeps the class name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.name = name;
        }
        self
    }

    /// Set the group path.
    pub fn at(mut self, export_path: impl Into<String>) -> Self {
        self.export_path = export_path.into();
        self
    }

    /// Set the module the class comes from.
    pub fn from_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }
}

impl TreeItem for ExternalCommand {
    fn tree_name(&self) -> &str {
        &self.name
    }

    fn tree_description(&self) -> Option<String> {
        self.class.description.clone()
    }
}

/// A ready-made process registered by a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalProcess {
    /// Leaf name.
    pub name: String,
    /// The process.
    pub process: Process,
    /// Dotted group path.
    pub export_path: String,
    /// Help text of the generated subcommand.
    pub description: Option<String>,
}

impl ExternalProcess {
    /// Register `process` as `name` under `export_path`.
    pub fn new(name: impl Into<String>, process: Process, export_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            process,
            export_path: export_path.into(),
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl TreeItem for ExternalProcess {
    fn tree_name(&self) -> &str {
        &self.name
    }

    fn tree_description(&self) -> Option<String> {
        self.description.clone()
    }
}

/// A bundle of commands and processes exported through one entrypoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginRegistry {
    /// Extra group appended to the entrypoint hierarchy.
    pub name: Option<String>,
    /// Registered command classes.
    pub commands: Vec<ExternalCommand>,
    /// Registered processes.
    pub processes: Vec<ExternalProcess>,
}

impl PluginRegistry {
    /// An unnamed registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose content lands in the `name` group.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Register a command class.
    pub fn register(&mut self, command: ExternalCommand) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Register a process.
    pub fn add_process(
        &mut self,
        name: impl Into<String>,
        process: Process,
        export_path: impl Into<String>,
    ) -> &mut Self {
        self.processes
            .push(ExternalProcess::new(name, process, export_path));
        self
    }

    /// Register a process built elsewhere.
    pub fn push_process(&mut self, process: ExternalProcess) -> &mut Self {
        self.processes.push(process);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{FieldDescriptor, ValueKind, REQUIRED_ARGUMENT};

    fn new_note() -> CommandClass {
        CommandClass::new(
            Schema::new("NewNote")
                .field(FieldDescriptor::new("title"))
                .field(
                    FieldDescriptor::new("notebook")
                        .with_default("~/notes.txt")
                        .kind(ValueKind::Path),
                ),
        )
    }

    #[test]
    fn test_not_runnable_class() {
        let class = new_note();
        assert!(!class.is_runnable());
        let err = class.instantiate([("title", REQUIRED_ARGUMENT)]).unwrap_err();
        assert!(matches!(err, PluginError::NotRunnable(name) if name == "NewNote"));
    }

    #[test]
    fn test_instantiate() {
        let class = new_note().with_template("echo {title} >> {notebook}");
        let process = class
            .instantiate([("title", ArgumentPolicy::fixed("hello"))])
            .unwrap();
        let line = process.command_line().unwrap();
        assert!(line.starts_with("echo hello >> "));
        assert!(line.contains("notes.txt"));
        assert!(!line.contains('{'));
    }

    #[test]
    fn test_instantiate_unknown_field() {
        let class = new_note().with_template("echo {title}");
        assert!(matches!(
            class.instantiate([("colour", ArgumentPolicy::fixed("red"))]),
            Err(PluginError::Argument(_))
        ));
    }

    #[test]
    fn test_external_command_names() {
        let cmd = ExternalCommand::new(new_note());
        assert_eq!(cmd.tree_name(), "NewNote");
        let cmd = cmd.named("new").at("notes");
        assert_eq!(cmd.tree_name(), "new");
        assert_eq!(cmd.export_path, "notes");
        assert_eq!(ExternalCommand::new(new_note()).named("").name, "NewNote");
    }

    #[test]
    fn test_registry_builder() {
        let mut registry = PluginRegistry::named("net");
        registry
            .register(ExternalCommand::new(new_note()))
            .add_process("ip", Process::command("curl -s ifconfig.me"), "");
        assert_eq!(registry.name.as_deref(), Some("net"));
        assert_eq!(registry.commands.len(), 1);
        assert_eq!(registry.processes[0].name, "ip");
    }
}
