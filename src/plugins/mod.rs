//! Plugin loading
//!
//! Plugins export three kinds of entrypoints: command classes, ready-made
//! processes, and registries bundling both. The [`PluginLoader`] reads them
//! from [`EntrypointSource`]s and files each one in the [`Plugin`] named
//! after the first segment of its module, at the hierarchy given by its
//! name (`notes__new` lands at `notes.new`).
//!
//! On disk, a plugin is a directory with a `plugin.toml` manifest, found by
//! [`ManifestSource`].
//!
//! # Example
//!
//! ```rust
//! use yeti::plugins::{Entrypoint, EntrypointObject, PluginLoader, StaticSource};
//! use yeti::process::Process;
//!
//! let source = StaticSource::new().with(Entrypoint::new(
//!     "net__ip",
//!     "net.processes",
//!     EntrypointObject::Process(Process::command("curl -s ifconfig.me")),
//! ));
//!
//! let mut loader = PluginLoader::new();
//! loader.load_plugins(&[&source]).unwrap();
//! assert_eq!(loader.plugin("net").unwrap().process("ip").unwrap().name, "ip");
//! ```

mod error;
mod loader;
mod manifest;
mod plugin;
mod registry;
mod source;

pub use error::{PluginError, PluginResult};
pub use loader::PluginLoader;
pub use manifest::{
    policy_from_value, ClassSpec, CommandEntry, ConvertSpec, FieldSpec, ManifestSource,
    PluginInfo, PluginManifest, ProcessEntry, ProcessSpec, RegistryCommand, RegistryEntry,
    RegistryProcess, MANIFEST_FILE,
};
pub use plugin::Plugin;
pub use registry::{CommandClass, ExternalCommand, ExternalProcess, PluginRegistry};
pub use source::{Entrypoint, EntrypointGroup, EntrypointObject, EntrypointSource, StaticSource};
