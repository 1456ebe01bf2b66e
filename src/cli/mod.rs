//! Command-line surface
//!
//! The `my` parser is generated from the loaded plugins: every plugin is a
//! subcommand and its process tree is nested below it. A process leaf takes
//! the shared run options (`--background`, `--output-file`, `--stdout`,
//! `--debug-output`) followed by the arguments its declarations expose.
//!
//! # Example
//!
//! ```rust,no_run
//! use yeti::cli::App;
//! use yeti::config::{EnvironmentLoader, SettingsLoader};
//!
//! let settings = SettingsLoader::new(&EnvironmentLoader::new(None)).unwrap().settings;
//! let app = App::load(settings).unwrap();
//! app.run(std::env::args_os().collect()).unwrap();
//! ```

pub mod builder;
pub mod commands;
pub mod error;
pub mod notify;
pub mod router;
pub mod runner;
pub mod utils;

pub use builder::{build_cli, process_options, BACKGROUND_FLAGS};
pub use error::{CliError, CliResult};
pub use notify::Notifier;
pub use router::{route, Route};
pub use runner::{App, RunOptions, STDOUT_PREFIX};
pub use utils::display_error_with_suggestions;
