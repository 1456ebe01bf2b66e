//! Plugin loader
//!
//! Turns entrypoints into plugins. Entrypoints are grouped by the first
//! segment of their module; their name gives the hierarchy they are
//! registered under.

use super::error::{PluginError, PluginResult};
use super::plugin::Plugin;
use super::registry::{ExternalCommand, ExternalProcess};
use super::source::{Entrypoint, EntrypointGroup, EntrypointObject, EntrypointSource};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Every plugin found in a set of entrypoint sources.
#[derive(Debug, Clone, Default)]
pub struct PluginLoader {
    plugins: IndexMap<String, Plugin>,
}

impl PluginLoader {
    /// A loader without plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plugin name of a module: its first dotted segment.
    pub fn plugin_name(module: &str) -> String {
        module.split('.').next().unwrap_or_default().to_string()
    }

    /// Split an entrypoint name into its leaf name and group hierarchy.
    ///
    /// `google__user__authenticate` gives `("authenticate", ["google", "user"])`.
    pub fn name_and_hierarchy(entrypoint_name: &str) -> (String, Vec<String>) {
        let mut segments: Vec<String> = entrypoint_name.split("__").map(str::to_string).collect();
        let name = segments.pop().unwrap_or_default();
        (name, segments)
    }

    fn plugin_for_module(&mut self, module: &str) -> &mut Plugin {
        let name = Self::plugin_name(module);
        self.plugins
            .entry(name.clone())
            .or_insert_with(|| Plugin::new(name, module))
    }

    /// Load every entrypoint of every source: command classes first, then
    /// processes, then registries.
    pub fn load_plugins(&mut self, sources: &[&dyn EntrypointSource]) -> PluginResult<()> {
        for group in EntrypointGroup::ALL {
            for source in sources {
                for entrypoint in source.entrypoints(group) {
                    info!("loading {} {}", group, entrypoint);
                    self.load(&entrypoint)?;
                }
            }
        }
        debug!("Loaded {} plugins", self.plugins.len());
        Ok(())
    }

    /// Load one entrypoint according to its declared group.
    pub fn load(&mut self, entrypoint: &Entrypoint) -> PluginResult<()> {
        match entrypoint.group {
            EntrypointGroup::Command => self.load_command(entrypoint),
            EntrypointGroup::Process => self.load_process(entrypoint),
            EntrypointGroup::Registry => self.load_registry(entrypoint),
        }
    }

    /// Register a command class entrypoint.
    ///
    /// Classes that cannot run are still registered.
    pub fn load_command(&mut self, entrypoint: &Entrypoint) -> PluginResult<()> {
        let class = match &entrypoint.object {
            EntrypointObject::Command(class) => class.clone(),
            other => {
                warn!("{} is not a command class, did not load {}", other, entrypoint.name);
                return Ok(());
            }
        };
        if !class.is_runnable() {
            warn!("Command class {} has no template and cannot be run", class.name());
        }

        let (name, hierarchy) = Self::name_and_hierarchy(&entrypoint.name);
        let command = ExternalCommand::new(class)
            .named(name)
            .at(hierarchy.join("."))
            .from_module(&entrypoint.module);
        self.plugin_for_module(&entrypoint.module).add_command(command)
    }

    /// Register a process entrypoint.
    pub fn load_process(&mut self, entrypoint: &Entrypoint) -> PluginResult<()> {
        let process = match &entrypoint.object {
            EntrypointObject::Process(process) => process.clone(),
            other => {
                warn!("{} is not a process, did not load {}", other, entrypoint.name);
                return Ok(());
            }
        };

        let (name, hierarchy) = Self::name_and_hierarchy(&entrypoint.name);
        let mut external = ExternalProcess::new(name, process, hierarchy.join("."));
        external.description = entrypoint.description.clone();
        self.plugin_for_module(&entrypoint.module).add_process(external)
    }

    /// Register everything a registry entrypoint holds.
    ///
    /// The entrypoint hierarchy, extended with the registry name, is the
    /// base path of the entries that do not give their own.
    pub fn load_registry(&mut self, entrypoint: &Entrypoint) -> PluginResult<()> {
        let registry = match &entrypoint.object {
            EntrypointObject::Registry(registry) => registry.clone(),
            other => {
                warn!("{} is not a registry, did not load {}", other, entrypoint.name);
                return Ok(());
            }
        };

        let (_, mut hierarchy) = Self::name_and_hierarchy(&entrypoint.name);
        if let Some(name) = registry.name.as_ref().filter(|n| !n.is_empty()) {
            hierarchy.push(name.clone());
        }
        let base_export_path = hierarchy.join(".");

        let plugin = self.plugin_for_module(&entrypoint.module);
        for mut command in registry.commands {
            if !command.class.is_runnable() {
                warn!("Command class {} has no template and cannot be run", command.class.name());
            }
            if command.export_path.is_empty() {
                command.export_path = base_export_path.clone();
            }
            if command.module.is_empty() {
                command.module = entrypoint.module.clone();
            }
            plugin.add_command(command)?;
        }
        for mut process in registry.processes {
            if process.export_path.is_empty() {
                process.export_path = base_export_path.clone();
            }
            plugin.add_process(process)?;
        }
        Ok(())
    }

    /// Loaded plugins by name.
    pub fn plugins(&self) -> &IndexMap<String, Plugin> {
        &self.plugins
    }

    /// Plugin by name.
    pub fn plugin(&self, name: &str) -> PluginResult<&Plugin> {
        self.plugins
            .get(name)
            .ok_or_else(|| PluginError::UnknownPlugin(name.to_string()))
    }

    /// Processes of every plugin, as indented text.
    pub fn processes_tree(&self) -> String {
        let mut out = String::new();
        for plugin in self.plugins.values() {
            out.push_str(&plugin.name);
            out.push('\n');
            plugin.processes().render(&mut out, 1);
        }
        out
    }

    /// JSON view of every plugin.
    pub fn as_dict(&self) -> Value {
        let map: Map<String, Value> = self
            .plugins
            .iter()
            .map(|(name, plugin)| (name.clone(), plugin.as_dict()))
            .collect();
        Value::Object(map)
    }
}
