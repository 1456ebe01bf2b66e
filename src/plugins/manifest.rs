//! Plugin manifest parsing
//!
//! A plugin is a directory holding a `plugin.toml` file that declares its
//! entrypoints:
//!
//! ```toml
//! [plugin]
//! module = "yeti_example.processes"
//!
//! [[command]]
//! entrypoint = "notes__NewNote"
//! template = "echo {title} >> {notebook}"
//! fields = [
//!     { name = "title" },
//!     { name = "notebook", default = "~/notes.txt", kind = "path" },
//! ]
//!
//! [[process]]
//! entrypoint = "notes__new"
//! class = "NewNote"
//! values = { title = { required = true }, notebook = { optional = true } }
//!
//! [[process]]
//! entrypoint = "uptime_words"
//! piped = true
//! steps = [{ command = "uptime" }, { command = "wc -w" }]
//!
//! [[registry]]
//! entrypoint = "tools"
//! name = "net"
//! process = [{ name = "ip", command = "curl -s ifconfig.me" }]
//! ```
//!
//! Field values are concrete unless written as a single-key table:
//! `{ required = ... }`, `{ optional = ... }`, `{ hidden = true }` or
//! `{ hole = true }`. The table under `required`/`optional` holds parser
//! options; `true` means none. `{ value = ... }` forces a concrete value.

use super::error::{PluginError, PluginResult};
use super::registry::{CommandClass, ExternalCommand, ExternalProcess, PluginRegistry};
use super::source::{Entrypoint, EntrypointGroup, EntrypointObject, EntrypointSource};
use crate::arguments::{
    ArgOptions, ArgumentError, ArgumentPolicy, ArgumentResult, FieldDescriptor, Schema, ValueKind,
};
use crate::process::{Converter, Process};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the manifest file inside a plugin directory.
pub const MANIFEST_FILE: &str = "plugin.toml";

/// Plugin manifest (`plugin.toml`)
#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    /// Plugin metadata
    pub plugin: PluginInfo,

    /// Command classes
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandEntry>,

    /// Process instances
    #[serde(default, rename = "process")]
    pub processes: Vec<ProcessEntry>,

    /// Registries
    #[serde(default, rename = "registry")]
    pub registries: Vec<RegistryEntry>,
}

/// Plugin metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PluginInfo {
    /// Module path of the entrypoints; its first segment names the plugin.
    pub module: String,

    /// Free text description
    #[serde(default)]
    pub description: Option<String>,
}

/// A command class declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassSpec {
    /// Class name
    #[serde(default)]
    pub class: Option<String>,

    /// Command line template
    #[serde(default)]
    pub template: Option<String>,

    /// One-line description
    #[serde(default)]
    pub description: Option<String>,

    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// One field of a command class.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,

    /// Static default
    #[serde(default)]
    pub default: Option<Value>,

    /// Value kind, `string` when absent
    #[serde(default)]
    pub kind: Option<ValueKind>,

    /// Whether the field can be set at all
    #[serde(default = "default_true")]
    pub init: bool,

    /// Never put on the command line
    #[serde(default)]
    pub exclude: bool,

    /// Argument names (`args`) and parser options
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

/// `[[command]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEntry {
    /// Entrypoint name
    pub entrypoint: String,

    /// Class declaration; the class is named after the entrypoint leaf
    /// unless `class` is given
    #[serde(flatten)]
    pub class: ClassSpec,
}

/// How a process is built.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessSpec {
    /// Shell command; a string, or a field value table
    #[serde(default)]
    pub command: Option<Value>,

    /// Command class to instantiate with `values`
    #[serde(default)]
    pub class: Option<String>,

    /// Field values for `class`
    #[serde(default)]
    pub values: Map<String, Value>,

    /// Constant output
    #[serde(default)]
    pub print: Option<Value>,

    /// Sub-processes run in order
    #[serde(default)]
    pub steps: Vec<ProcessSpec>,

    /// Pipe the steps into each other
    #[serde(default)]
    pub piped: bool,

    /// Fill the process from the previous output
    #[serde(default)]
    pub convert: Option<ConvertSpec>,
}

/// Stdin converter declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertSpec {
    /// `first_line`, `output`, `lines` or `json`
    pub mode: String,

    /// Field receiving the value, for every mode but `json`
    #[serde(default)]
    pub field: Option<String>,
}

/// `[[process]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessEntry {
    /// Entrypoint name
    pub entrypoint: String,

    /// Help text of the subcommand
    #[serde(default)]
    pub description: Option<String>,

    /// The process
    #[serde(flatten)]
    pub spec: ProcessSpec,
}

/// Command class exported by a registry.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryCommand {
    /// Leaf name, the class name when absent
    #[serde(default)]
    pub name: Option<String>,

    /// Group path
    #[serde(default)]
    pub export_path: String,

    /// Class declaration
    #[serde(flatten)]
    pub class: ClassSpec,
}

/// Process exported by a registry.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryProcess {
    /// Leaf name
    pub name: String,

    /// Group path
    #[serde(default)]
    pub export_path: String,

    /// Help text of the subcommand
    #[serde(default)]
    pub description: Option<String>,

    /// The process
    #[serde(flatten)]
    pub spec: ProcessSpec,
}

/// `[[registry]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryEntry {
    /// Entrypoint name
    pub entrypoint: String,

    /// Group appended to the entrypoint hierarchy
    #[serde(default)]
    pub name: Option<String>,

    /// Command classes
    #[serde(default, rename = "command")]
    pub commands: Vec<RegistryCommand>,

    /// Processes
    #[serde(default, rename = "process")]
    pub processes: Vec<RegistryProcess>,
}

impl PluginManifest {
    /// Parse a manifest from a file
    pub fn from_file(path: &Path) -> PluginResult<Self> {
        if !path.exists() {
            return Err(PluginError::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse a manifest from a string; `origin` is used in error messages
    pub fn parse(content: &str, origin: &Path) -> PluginResult<Self> {
        let manifest: PluginManifest = toml::from_str(content)
            .map_err(|e| PluginError::invalid_manifest(origin, e.to_string()))?;

        if manifest.plugin.module.trim().is_empty() {
            return Err(PluginError::invalid_manifest(origin, "plugin.module is required"));
        }
        Ok(manifest)
    }

    /// Build every entrypoint the manifest declares.
    pub fn entrypoints(&self) -> PluginResult<Vec<Entrypoint>> {
        let module = self.plugin.module.as_str();
        let mut classes: IndexMap<String, CommandClass> = IndexMap::new();
        let mut entries = Vec::new();

        for entry in &self.commands {
            let leaf = entry.entrypoint.rsplit("__").next().unwrap_or_default();
            let class = build_class(&entry.class, leaf)?;
            classes.insert(class.name().to_string(), class.clone());
            entries.push(
                Entrypoint::new(&entry.entrypoint, module, EntrypointObject::Command(class))
                    .with_description(entry.class.description.clone()),
            );
        }

        // Registry classes can be instantiated by any process of the manifest
        let mut registry_classes = Vec::new();
        for entry in &self.registries {
            let mut built = Vec::new();
            for command in &entry.commands {
                let fallback = command.name.as_deref().unwrap_or_default();
                let class = build_class(&command.class, fallback)?;
                classes.insert(class.name().to_string(), class.clone());
                built.push(class);
            }
            registry_classes.push(built);
        }

        for entry in &self.processes {
            let process = build_process(&entry.spec, &classes)?;
            entries.push(
                Entrypoint::new(&entry.entrypoint, module, EntrypointObject::Process(process))
                    .with_description(entry.description.clone()),
            );
        }

        for (entry, built) in self.registries.iter().zip(registry_classes) {
            let mut registry = PluginRegistry {
                name: entry.name.clone(),
                ..PluginRegistry::default()
            };
            for (command, class) in entry.commands.iter().zip(built) {
                let mut external = ExternalCommand::new(class)
                    .at(&command.export_path)
                    .from_module(module);
                if let Some(name) = &command.name {
                    external = external.named(name);
                }
                registry.register(external);
            }
            for process in &entry.processes {
                let mut external = ExternalProcess::new(
                    &process.name,
                    build_process(&process.spec, &classes)?,
                    &process.export_path,
                );
                external.description = process.description.clone();
                registry.push_process(external);
            }
            entries.push(Entrypoint::new(
                &entry.entrypoint,
                module,
                EntrypointObject::Registry(registry),
            ));
        }

        Ok(entries)
    }
}

fn build_class(spec: &ClassSpec, fallback_name: &str) -> PluginResult<CommandClass> {
    let name = spec
        .class
        .clone()
        .unwrap_or_else(|| fallback_name.to_string());
    if name.is_empty() {
        return Err(PluginError::invalid_manifest(
            "<command>",
            "a command class needs a `class` name",
        ));
    }

    let mut schema = Schema::new(name);
    for field in &spec.fields {
        schema = schema.field(build_field(field)?);
    }

    let mut class = CommandClass::new(schema);
    class.template = spec.template.clone();
    class.description = spec.description.clone();
    Ok(class)
}

fn build_field(spec: &FieldSpec) -> ArgumentResult<FieldDescriptor> {
    let mut field = FieldDescriptor::new(&spec.name);
    if let Some(kind) = spec.kind {
        field = field.kind(kind);
    }
    if let Some(default) = &spec.default {
        field = field.with_default(default.clone());
    }
    if !spec.options.is_empty() {
        field = field.args(ArgOptions::from_map(&spec.options)?);
    }
    if spec.exclude {
        field = field.excluded();
    }
    if !spec.init {
        field = field.not_init();
    }
    Ok(field)
}

/// Read a field value written in a manifest.
pub fn policy_from_value(value: &Value) -> ArgumentResult<ArgumentPolicy> {
    if let Value::Object(map) = value {
        if let (1, Some((key, inner))) = (map.len(), map.iter().next()) {
            match key.as_str() {
                "required" => return Ok(ArgumentPolicy::Required(parser_options(key, inner)?)),
                "optional" => return Ok(ArgumentPolicy::Optional(parser_options(key, inner)?)),
                "hidden" => return sentinel(key, inner, ArgumentPolicy::Hidden),
                "hole" => return sentinel(key, inner, ArgumentPolicy::Hole),
                "value" => return Ok(ArgumentPolicy::Fixed(inner.clone())),
                _ => {}
            }
        }
    }
    Ok(ArgumentPolicy::Fixed(value.clone()))
}

fn sentinel(key: &str, value: &Value, policy: ArgumentPolicy) -> ArgumentResult<ArgumentPolicy> {
    match value {
        Value::Bool(true) => Ok(policy),
        _ => Err(ArgumentError::InvalidOption {
            key: key.to_string(),
            reason: "only `true` is accepted".to_string(),
        }),
    }
}

fn parser_options(key: &str, value: &Value) -> ArgumentResult<ArgOptions> {
    match value {
        Value::Bool(true) => Ok(ArgOptions::new()),
        Value::Object(map) => ArgOptions::from_map(map),
        _ => Err(ArgumentError::InvalidOption {
            key: key.to_string(),
            reason: "expected `true` or a table of parser options".to_string(),
        }),
    }
}

fn build_process(spec: &ProcessSpec, classes: &IndexMap<String, CommandClass>) -> PluginResult<Process> {
    let process = if let Some(command) = &spec.command {
        Process::command(policy_from_value(command)?)
    } else if let Some(name) = &spec.class {
        let class = classes
            .get(name)
            .ok_or_else(|| PluginError::UnknownClass(name.clone()))?;
        let mut values = Vec::with_capacity(spec.values.len());
        for (field, value) in &spec.values {
            values.push((field.clone(), policy_from_value(value)?));
        }
        class.instantiate(values)?
    } else if let Some(value) = &spec.print {
        Process::print(value.clone())
    } else if !spec.steps.is_empty() {
        let steps = spec
            .steps
            .iter()
            .map(|step| build_process(step, classes))
            .collect::<PluginResult<Vec<_>>>()?;
        Process::sequential(steps, spec.piped)
    } else {
        return Err(PluginError::invalid_manifest(
            "<process>",
            "a process needs one of `command`, `class`, `print` or `steps`",
        ));
    };

    match &spec.convert {
        Some(convert) => Ok(Process::converter(process, build_converter(convert)?)),
        None => Ok(process),
    }
}

fn build_converter(spec: &ConvertSpec) -> PluginResult<Converter> {
    let field = || {
        spec.field.clone().ok_or_else(|| {
            PluginError::invalid_manifest(
                "<convert>",
                format!("converter '{}' needs a `field`", spec.mode),
            )
        })
    };
    match spec.mode.as_str() {
        "first_line" => Ok(Converter::FirstLine { field: field()? }),
        "output" => Ok(Converter::Output { field: field()? }),
        "lines" => Ok(Converter::Lines { field: field()? }),
        "json" => Ok(Converter::Json),
        other => Err(PluginError::invalid_manifest(
            "<convert>",
            format!("unknown converter '{}'", other),
        )),
    }
}

/// Entrypoints read from plugin directories.
///
/// Every `<dir>/*/plugin.toml` is parsed once, when the source is built.
/// Unreadable manifests are logged and skipped.
#[derive(Debug, Clone, Default)]
pub struct ManifestSource {
    entries: Vec<Entrypoint>,
    manifests: Vec<PathBuf>,
}

impl ManifestSource {
    /// Scan plugin directories.
    pub fn scan<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut source = Self::default();
        for dir in dirs {
            source.scan_dir(dir.as_ref());
        }
        source
    }

    fn scan_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping plugin directory {:?}: {}", dir, e);
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .map(|path| path.join(MANIFEST_FILE))
            .filter(|path| path.exists())
            .collect();
        paths.sort();

        for path in paths {
            match PluginManifest::from_file(&path).and_then(|m| m.entrypoints()) {
                Ok(entrypoints) => {
                    debug!("Found {} entrypoints in {:?}", entrypoints.len(), path);
                    self.entries.extend(entrypoints);
                    self.manifests.push(path);
                }
                Err(e) => warn!("Failed to load plugin manifest {:?}: {}", path, e),
            }
        }
    }

    /// Manifests loaded successfully.
    pub fn manifests(&self) -> &[PathBuf] {
        &self.manifests
    }
}

impl EntrypointSource for ManifestSource {
    fn entrypoints(&self, group: EntrypointGroup) -> Vec<Entrypoint> {
        self.entries
            .iter()
            .filter(|e| e.group == group)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    const NOTES_MANIFEST: &str = r#"
[plugin]
module = "yeti_example.processes"

[[command]]
entrypoint = "notes__NewNote"
template = "echo {title} >> {notebook}"
description = "Append a note"
fields = [
    { name = "title" },
    { name = "notebook", default = "~/notes.txt", kind = "path" },
]

[[process]]
entrypoint = "notes__new"
class = "NewNote"
description = "Add a note"
values = { title = { required = true }, notebook = { optional = { help = "Notes file" } } }

[[process]]
entrypoint = "uptime_words"
piped = true
steps = [{ command = "uptime" }, { command = "wc -w" }]

[[registry]]
entrypoint = "tools"
name = "net"

[[registry.process]]
name = "ip"
command = "curl -s ifconfig.me"

[[registry.command]]
class = "Ping"
template = "ping -c 1 {host}"
fields = [{ name = "host" }]
"#;

    fn manifest() -> PluginManifest {
        PluginManifest::parse(NOTES_MANIFEST, Path::new("plugin.toml")).unwrap()
    }

    #[test]
    fn test_parse_manifest() {
        let m = manifest();
        assert_eq!(m.plugin.module, "yeti_example.processes");
        assert_eq!(m.commands.len(), 1);
        assert_eq!(m.commands[0].class.fields[1].kind, Some(ValueKind::Path));
        assert_eq!(m.processes.len(), 2);
        assert!(m.processes[1].spec.piped);
        assert_eq!(m.registries[0].name.as_deref(), Some("net"));
        assert_eq!(m.processes[0].description.as_deref(), Some("Add a note"));
    }

    #[test]
    fn test_missing_module() {
        let err = PluginManifest::parse("[plugin]\nmodule = \"\"\n", Path::new("x")).unwrap_err();
        assert!(matches!(err, PluginError::InvalidManifest { .. }));
        assert!(PluginManifest::parse("[other]\n", Path::new("x")).is_err());
    }

    #[test]
    fn test_entrypoints() {
        let entries = manifest().entrypoints().unwrap();
        let groups: Vec<EntrypointGroup> = entries.iter().map(|e| e.group).collect();
        assert_eq!(
            groups,
            vec![
                EntrypointGroup::Command,
                EntrypointGroup::Process,
                EntrypointGroup::Process,
                EntrypointGroup::Registry
            ]
        );

        match &entries[0].object {
            EntrypointObject::Command(class) => {
                assert_eq!(class.name(), "NewNote");
                assert!(class.is_runnable());
            }
            other => panic!("unexpected {:?}", other),
        }

        match &entries[1].object {
            EntrypointObject::Process(Process::Command(cmd)) => {
                assert!(cmd.declaration.get("title").unwrap().is_required());
                assert!(cmd.declaration.get("notebook").unwrap().is_optional());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(entries[1].description.as_deref(), Some("Add a note"));

        match &entries[2].object {
            EntrypointObject::Process(process) => {
                assert_eq!(process.command_line().unwrap(), "uptime | wc -w");
            }
            other => panic!("unexpected {:?}", other),
        }

        match &entries[3].object {
            EntrypointObject::Registry(registry) => {
                assert_eq!(registry.processes[0].name, "ip");
                assert_eq!(registry.commands[0].name, "Ping");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_policy_from_value() {
        assert_eq!(
            policy_from_value(&json!({"required": true})).unwrap(),
            ArgumentPolicy::Required(ArgOptions::new())
        );
        assert_eq!(policy_from_value(&json!({"hidden": true})).unwrap(), ArgumentPolicy::Hidden);
        assert_eq!(policy_from_value(&json!({"hole": true})).unwrap(), ArgumentPolicy::Hole);
        assert_eq!(
            policy_from_value(&json!({"value": {"hidden": true}})).unwrap(),
            ArgumentPolicy::fixed(json!({"hidden": true}))
        );
        assert_eq!(policy_from_value(&json!("plain")).unwrap(), ArgumentPolicy::fixed("plain"));
        assert_eq!(
            policy_from_value(&json!({"a": 1, "b": 2})).unwrap(),
            ArgumentPolicy::fixed(json!({"a": 1, "b": 2}))
        );

        let optional = policy_from_value(&json!({"optional": {"default": true, "action": "store_true"}})).unwrap();
        let opts = optional.overrides().unwrap();
        assert_eq!(opts.options.default, Some(json!(true)));
        assert!(policy_from_value(&json!({"optional": 3})).is_err());
        assert!(policy_from_value(&json!({"hidden": false})).is_err());
        assert!(policy_from_value(&json!({"hole": "yes"})).is_err());
        assert!(matches!(
            policy_from_value(&json!({"required": {"dest": "x"}})),
            Err(ArgumentError::DestOverride)
        ));
    }

    #[test]
    fn test_unknown_class() {
        let content = r#"
[plugin]
module = "p"

[[process]]
entrypoint = "x"
class = "Missing"
"#;
        let err = PluginManifest::parse(content, Path::new("x"))
            .unwrap()
            .entrypoints()
            .unwrap_err();
        assert!(matches!(err, PluginError::UnknownClass(name) if name == "Missing"));
    }

    #[test]
    fn test_converter_process() {
        let content = r#"
[plugin]
module = "p"

[[process]]
entrypoint = "count"
steps = [
    { command = "echo 'wc -l'" },
    { command = { hole = true }, convert = { mode = "first_line", field = "cmd" } },
]
"#;
        let entries = PluginManifest::parse(content, Path::new("x"))
            .unwrap()
            .entrypoints()
            .unwrap();
        match &entries[0].object {
            EntrypointObject::Process(Process::Sequential(seq)) => {
                assert!(!seq.piped);
                assert!(matches!(seq.processes[1], Process::Converter(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_manifest_source_skips_broken_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("notes");
        let broken = dir.path().join("broken");
        fs::create_dir_all(&good).unwrap();
        fs::create_dir_all(&broken).unwrap();
        fs::write(good.join(MANIFEST_FILE), NOTES_MANIFEST).unwrap();
        fs::write(broken.join(MANIFEST_FILE), "not toml [").unwrap();
        fs::write(dir.path().join("stray.toml"), "").unwrap();

        let source = ManifestSource::scan([dir.path(), Path::new("/nonexistent/plugins")]);
        assert_eq!(source.manifests().len(), 1);
        assert_eq!(source.entrypoints(EntrypointGroup::Process).len(), 2);
        assert_eq!(source.entrypoints(EntrypointGroup::Registry).len(), 1);
    }
}
