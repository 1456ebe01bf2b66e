//! Error types for argument exposition and reconciliation

use thiserror::Error;

/// Result type for argument operations
pub type ArgumentResult<T> = Result<T, ArgumentError>;

/// Errors raised while building, exposing or reconciling declarations.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// An explicit destination was supplied through parser options.
    #[error("Setting 'dest' is not supported (it breaks the parsing afterwards)")]
    DestOverride,

    /// A parser option key is not understood.
    #[error("Unknown parser option '{0}'")]
    UnknownOption(String),

    /// A parser option has a value of the wrong shape.
    #[error("Invalid value for parser option '{key}': {reason}")]
    InvalidOption {
        /// Option key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A hidden field has neither a default nor a default factory.
    #[error("Field {0} was hidden but does not have a default value or factory")]
    HiddenWithoutDefault(String),

    /// The declaration does not have a field with this name.
    #[error("{schema} has no field named '{field}'")]
    UnknownField {
        /// Declaration type name.
        schema: String,
        /// Requested field.
        field: String,
    },

    /// A field without default was not given a value.
    #[error("{schema} is missing a value for field '{field}'")]
    MissingField {
        /// Declaration type name.
        schema: String,
        /// Missing field.
        field: String,
    },

    /// The field cannot be set at construction time.
    #[error("Field '{0}' cannot be set when creating a declaration")]
    NotSettable(String),

    /// A field still holds a sentinel when a concrete value is needed.
    #[error("Field '{0}' has no concrete value")]
    Unresolved(String),

    /// A raw CLI value could not be converted.
    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        /// Field being parsed.
        field: String,
        /// Raw value.
        value: String,
        /// Conversion failure.
        reason: String,
    },

    /// Reading a parsed value back from clap failed.
    #[error("Failed to read argument '{field}': {reason}")]
    Extraction {
        /// Field being read.
        field: String,
        /// clap failure.
        reason: String,
    },
}
