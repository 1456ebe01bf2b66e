//! A loaded plugin and its registration trees

use super::error::{PluginError, PluginResult};
use super::registry::{ExternalCommand, ExternalProcess};
use crate::arguments::{ExposeArguments, IncludeFields};
use crate::tree::{AttrTree, AttrTreeConfig, Hierarchy};
use clap::Command;
use indexmap::IndexMap;
use serde_json::{json, Value};

/// Commands and processes registered under one plugin name.
#[derive(Debug, Clone)]
pub struct Plugin {
    /// Plugin name, also the top-level subcommand.
    pub name: String,
    /// Module the first entrypoint came from.
    pub module: String,
    commands: AttrTree<ExternalCommand>,
    processes: AttrTree<ExternalProcess>,
}

impl Plugin {
    /// An empty plugin.
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            commands: AttrTree::new(
                "__cmds__",
                AttrTreeConfig {
                    expose_leaf_items: true,
                },
            ),
            processes: AttrTree::new(
                "__processes__",
                AttrTreeConfig {
                    expose_leaf_items: false,
                },
            ),
        }
    }

    /// Register a command class under its export path.
    pub fn add_command(&mut self, command: ExternalCommand) -> PluginResult<()> {
        let hierarchy = Hierarchy::from(command.export_path.as_str());
        self.commands.add_item(command, hierarchy)?;
        Ok(())
    }

    /// Register a process under its export path.
    pub fn add_process(&mut self, process: ExternalProcess) -> PluginResult<()> {
        let hierarchy = Hierarchy::from(process.export_path.as_str());
        self.processes.add_item(process, hierarchy)?;
        Ok(())
    }

    /// Command classes tree.
    pub fn commands(&self) -> &AttrTree<ExternalCommand> {
        &self.commands
    }

    /// Processes tree.
    pub fn processes(&self) -> &AttrTree<ExternalProcess> {
        &self.processes
    }

    /// Command class at a full or unambiguous partial path.
    pub fn command(&self, path: &str) -> PluginResult<&ExternalCommand> {
        Ok(self.commands.lookup(path)?)
    }

    /// Process at a full or unambiguous partial path.
    pub fn process(&self, path: &str) -> PluginResult<&ExternalProcess> {
        Ok(self.processes.lookup(path)?)
    }

    /// Every command class by leaf name.
    pub fn all_commands(&self) -> IndexMap<String, &ExternalCommand> {
        self.commands.all_items()
    }

    /// JSON view of both trees.
    pub fn as_dict(&self) -> Value {
        json!({
            "module": self.module,
            "commands": self.commands.as_dict(),
            "processes": self.processes.as_dict(),
        })
    }

    /// Add the process tree to `command` as nested subcommands.
    ///
    /// `common` adds the flags every process subcommand shares; the process
    /// arguments come after them.
    pub fn add_arguments<F>(&self, command: Command, common: &F) -> PluginResult<Command>
    where
        F: Fn(Command) -> Command,
    {
        self.processes.add_subcommands(
            command,
            "",
            &mut |sub: Command, _path: &str, item: &ExternalProcess| {
                item.process
                    .add_arguments(common(sub), IncludeFields::All)
                    .map_err(PluginError::from)
            },
        )
    }
}

impl std::fmt::Display for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Plugin {}: commands={}, processes={}>",
            self.name,
            self.commands.len(),
            self.processes.len()
        )
    }
}
