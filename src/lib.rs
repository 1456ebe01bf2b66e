//! Marvelous Yeti - a personal process runner
//!
//! Yeti turns declarative shell commands into a generated command line.
//! Plugins declare commands and processes; the `my` binary exposes each of
//! them as a subcommand whose arguments come from the declarations.
//!
//! - **`arguments`** - Declarations and their exposition as CLI arguments
//! - **`process`** - Shell commands, sequences, pipes and stdin converters
//! - **`tree`** - Hierarchical registration of named items
//! - **`plugins`** - Plugin manifests and loading (`plugins` feature)
//! - **`config`** - Settings and environment loading (`config` feature)
//! - **`observability`** - Logging setup (`observability` feature)
//! - **`cli`** - The generated command line and helper binaries (`cli` feature)
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! yeti = { version = "0.3", default-features = false, features = ["plugins"] }
//! # Or enable everything:
//! yeti = { version = "0.3", features = ["all"] }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use yeti::process::{Process, RunContext};
//!
//! let words = Process::command("uptime") | Process::command("wc -w");
//! for line in words.run(&RunContext::default()).unwrap() {
//!     println!("{}", line.unwrap());
//! }
//! ```

#![warn(missing_docs)]

pub mod arguments;
pub mod process;
pub mod tree;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Logging setup (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// Plugin loading (enabled with the `plugins` feature)
#[cfg(feature = "plugins")]
pub mod plugins;

/// Generated command line (enabled with the `cli` feature)
#[cfg(feature = "cli")]
pub mod cli;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::arguments::{
        ArgOptions, ArgumentPolicy, Declaration, ExposeArguments, FieldDescriptor, IncludeFields,
        Schema, ValueKind,
    };
    pub use crate::process::{Converter, Process, RunContext};
    pub use crate::tree::{AttrTree, AttrTreeConfig, TreeItem};

    #[cfg(feature = "config")]
    pub use crate::config::{EnvironmentLoader, Settings, SettingsLoader};

    #[cfg(feature = "plugins")]
    pub use crate::plugins::{Plugin, PluginLoader};
}
