//! Entrypoints and the sources providing them

use super::registry::{CommandClass, PluginRegistry};
use crate::process::Process;
use serde::{Deserialize, Serialize};

/// Kind of object an entrypoint exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrypointGroup {
    /// A command class.
    Command,
    /// A process instance.
    Process,
    /// A bundle of commands and processes.
    Registry,
}

impl EntrypointGroup {
    /// Groups in loading order.
    pub const ALL: [EntrypointGroup; 3] = [
        EntrypointGroup::Command,
        EntrypointGroup::Process,
        EntrypointGroup::Registry,
    ];

    /// Get the string representation of the group.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntrypointGroup::Command => "my.plugins.command",
            EntrypointGroup::Process => "my.plugins.process",
            EntrypointGroup::Registry => "my.plugins.registry",
        }
    }
}

impl std::fmt::Display for EntrypointGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Object an entrypoint resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum EntrypointObject {
    /// A command class.
    Command(CommandClass),
    /// A process instance.
    Process(Process),
    /// A registry.
    Registry(PluginRegistry),
}

impl EntrypointObject {
    /// Group this object belongs to.
    pub fn group(&self) -> EntrypointGroup {
        match self {
            EntrypointObject::Command(_) => EntrypointGroup::Command,
            EntrypointObject::Process(_) => EntrypointGroup::Process,
            EntrypointObject::Registry(_) => EntrypointGroup::Registry,
        }
    }

    fn describe(&self) -> String {
        match self {
            EntrypointObject::Command(class) => format!("command class {}", class.name()),
            EntrypointObject::Process(process) => format!("process {}", process),
            EntrypointObject::Registry(registry) => format!(
                "registry {}",
                registry.name.as_deref().unwrap_or("<unnamed>")
            ),
        }
    }
}

impl std::fmt::Display for EntrypointObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A named export of a plugin module.
///
/// The name reads `group__subgroup__leaf`: every segment but the last is
/// a group of the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Entrypoint {
    /// Entrypoint name.
    pub name: String,
    /// Module path; its first segment is the plugin name.
    pub module: String,
    /// Declared group.
    pub group: EntrypointGroup,
    /// Exported object.
    pub object: EntrypointObject,
    /// Help text for the registered object.
    pub description: Option<String>,
}

impl Entrypoint {
    /// An entrypoint whose declared group is the group of its object.
    pub fn new(name: impl Into<String>, module: impl Into<String>, object: EntrypointObject) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            group: object.group(),
            object,
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Override the declared group.
    pub fn in_group(mut self, group: EntrypointGroup) -> Self {
        self.group = group;
        self
    }
}

impl std::fmt::Display for Entrypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {} [{}]", self.name, self.module, self.group)
    }
}

/// Somewhere entrypoints come from.
pub trait EntrypointSource {
    /// Entrypoints declared in `group`.
    fn entrypoints(&self, group: EntrypointGroup) -> Vec<Entrypoint>;
}

/// Entrypoints built in code.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<Entrypoint>,
}

impl StaticSource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entrypoint.
    pub fn with(mut self, entrypoint: Entrypoint) -> Self {
        self.entries.push(entrypoint);
        self
    }

    /// Add an entrypoint in place.
    pub fn push(&mut self, entrypoint: Entrypoint) {
        self.entries.push(entrypoint);
    }

    /// Number of entrypoints, all groups included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the source is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntrypointSource for StaticSource {
    fn entrypoints(&self, group: EntrypointGroup) -> Vec<Entrypoint> {
        self.entries
            .iter()
            .filter(|e| e.group == group)
            .cloned()
            .collect()
    }
}

impl From<Vec<Entrypoint>> for StaticSource {
    fn from(entries: Vec<Entrypoint>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_names() {
        assert_eq!(EntrypointGroup::Command.to_string(), "my.plugins.command");
        assert_eq!(EntrypointGroup::ALL[2], EntrypointGroup::Registry);
        let parsed: EntrypointGroup = serde_json::from_str("\"process\"").unwrap();
        assert_eq!(parsed, EntrypointGroup::Process);
    }

    #[test]
    fn test_static_source_filters_by_group() {
        let source = StaticSource::new()
            .with(Entrypoint::new(
                "ip",
                "net.processes",
                EntrypointObject::Process(Process::command("curl -s ifconfig.me")),
            ))
            .with(Entrypoint::new(
                "tools",
                "net.registry",
                EntrypointObject::Registry(PluginRegistry::new()),
            ));
        assert_eq!(source.len(), 2);
        assert_eq!(source.entrypoints(EntrypointGroup::Process).len(), 1);
        assert_eq!(source.entrypoints(EntrypointGroup::Registry)[0].name, "tools");
        assert!(source.entrypoints(EntrypointGroup::Command).is_empty());
    }

    #[test]
    fn test_declared_group_override() {
        let ep = Entrypoint::new(
            "x",
            "m",
            EntrypointObject::Registry(PluginRegistry::named("oauth")),
        )
        .in_group(EntrypointGroup::Process);
        assert_eq!(ep.group, EntrypointGroup::Process);
        assert_eq!(ep.object.group(), EntrypointGroup::Registry);
        assert_eq!(ep.object.to_string(), "registry oauth");
    }
}
