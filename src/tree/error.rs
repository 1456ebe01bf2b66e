//! Error types for the registration tree

use thiserror::Error;

/// Result type for tree operations
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors raised while building or querying a tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// An item and a group would share a name at the same node.
    #[error("Cannot add '{name}' at '{path}': an item and a group cannot share a name")]
    NameCollision {
        /// Colliding name.
        name: String,
        /// Node where the collision happens, empty for the root.
        path: String,
    },

    /// An item with this name already exists at the node.
    #[error("An item named '{name}' already exists at '{path}'")]
    DuplicateItem {
        /// Item name.
        name: String,
        /// Node path, empty for the root.
        path: String,
    },

    /// A name cannot be used as a path segment.
    #[error("Invalid tree name '{0}'")]
    InvalidName(String),

    /// Nothing is stored under the requested path.
    #[error("Nothing found for '{0}'")]
    NotFound(String),

    /// Several stored paths match the request.
    #[error("'{query}' is ambiguous, candidates: {}", candidates.join(", "))]
    Ambiguous {
        /// Requested path.
        query: String,
        /// Matching full paths.
        candidates: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_display() {
        let err = TreeError::Ambiguous {
            query: "Lucky".to_string(),
            candidates: vec!["bully.Lucky".to_string(), "shepard.Lucky".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "'Lucky' is ambiguous, candidates: bully.Lucky, shepard.Lucky"
        );
    }
}
