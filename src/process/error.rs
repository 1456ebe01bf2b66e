//! Error types for process composition and execution

use crate::arguments::ArgumentError;
use thiserror::Error;

/// Result type for process operations
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors raised while preparing or running processes.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Declaration error.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The command template cannot be parsed or rendered.
    #[error("Invalid template '{template}': {reason}")]
    Template {
        /// Template source.
        template: String,
        /// What went wrong.
        reason: String,
    },

    /// The shell could not be started.
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        /// Command line.
        command: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero status.
    #[error("Command '{command}' returned non-zero exit status {status}")]
    Exit {
        /// Exit status, `-1` when killed by a signal.
        status: i32,
        /// Command line.
        command: String,
    },

    /// The stdin converter could not turn the output into replacements.
    #[error("Converter failed: {0}")]
    Converter(String),

    /// A replacement targets something the process does not have.
    #[error("Cannot replace '{field}' in {process}")]
    Replacement {
        /// Process being replaced into.
        process: String,
        /// Offending key.
        field: String,
    },

    /// The process has no shell command line.
    #[error("{0} is not a shell command")]
    NotShellCommand(String),

    /// I/O failure while streaming output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Create a template error
    pub fn template<S: Into<String>, R: Into<String>>(template: S, reason: R) -> Self {
        Self::Template {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Create a converter error
    pub fn converter<S: Into<String>>(msg: S) -> Self {
        Self::Converter(msg.into())
    }

    /// Exit status carried by the error, if it is an exit failure.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            Self::Exit { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_error() {
        let err = ProcessError::Exit {
            status: 3,
            command: "false".to_string(),
        };
        assert_eq!(err.exit_status(), Some(3));
        assert!(err.to_string().contains("false"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_argument_error_conversion() {
        let err: ProcessError = ArgumentError::Unresolved("cmd".to_string()).into();
        assert!(matches!(err, ProcessError::Argument(_)));
        assert_eq!(err.exit_status(), None);
    }
}
