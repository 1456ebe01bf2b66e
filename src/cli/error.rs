//! Error types for CLI operations

use crate::arguments::ArgumentError;
use crate::plugins::PluginError;
use crate::process::ProcessError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur during CLI command execution
#[derive(Error, Debug)]
pub enum CliError {
    /// Declaration or argument parsing error
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Process preparation or execution error
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Plugin loading error
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Settings could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// No process at the requested path
    #[error("Plugin '{plugin}' has no process '{path}'")]
    UnknownProcess {
        /// Plugin name
        plugin: String,
        /// Dotted process path
        path: String,
    },

    /// The command line does not name a process
    #[error("No process selected")]
    NoProcess,

    /// The user settings file already exists
    #[error("User configuration file already exists: {}", .0.display())]
    ConfigExists(PathBuf),

    /// The user settings path is a directory
    #[error("Path {} exists but it is a directory.", .0.display())]
    ConfigIsDirectory(PathBuf),

    /// The user settings file is missing
    #[error("No user configuration file at {}, run `my-config init` first", .0.display())]
    ConfigMissing(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CliError {
    /// Exit code the binaries end with for this error.
    ///
    /// A failing child process passes its own status through.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Process(err) => match err.exit_status() {
                Some(status) if status > 0 => status,
                _ => 1,
            },
            _ => 1,
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Config(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Serialization(err.to_string())
    }
}
