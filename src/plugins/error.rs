//! Plugin error types

use crate::arguments::ArgumentError;
use crate::process::ProcessError;
use crate::tree::TreeError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that can occur while loading plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Declaration error.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Process construction error.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Registration conflict or failed lookup.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Manifest file not found.
    #[error("Plugin manifest not found: {0:?}")]
    ManifestNotFound(PathBuf),

    /// The manifest cannot be read or does not describe valid entrypoints.
    #[error("Invalid plugin manifest {path:?}: {reason}")]
    InvalidManifest {
        /// Manifest path, or a description of the in-memory source.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// A process refers to a command class that is not declared.
    #[error("Unknown command class '{0}'")]
    UnknownClass(String),

    /// The command class has no command template.
    #[error("Command class '{0}' cannot be run: it has no template")]
    NotRunnable(String),

    /// No plugin with this name was loaded.
    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// Create an invalid manifest error
    pub fn invalid_manifest<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::InvalidManifest {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::NotRunnable("NewNote".to_string());
        assert_eq!(
            err.to_string(),
            "Command class 'NewNote' cannot be run: it has no template"
        );

        let err = PluginError::invalid_manifest("/tmp/plugin.toml", "missing [plugin]");
        assert!(err.to_string().contains("missing [plugin]"));
    }

    #[test]
    fn test_tree_error_conversion() {
        let err: PluginError = TreeError::NotFound("x".to_string()).into();
        assert!(matches!(err, PluginError::Tree(_)));
        assert_eq!(err.to_string(), "Nothing found for 'x'");
    }
}
