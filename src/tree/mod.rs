//! Hierarchical registration tree
//!
//! Plugins register commands and processes under dotted paths such as
//! `notes.new`. An [`AttrTree`] stores them as leaves of nested groups and
//! turns the structure into nested clap subcommands.
//!
//! # Example
//!
//! ```rust
//! use yeti::tree::{AttrTree, AttrTreeConfig, TreeItem};
//!
//! struct Dog(String);
//!
//! impl TreeItem for Dog {
//!     fn tree_name(&self) -> &str {
//!         &self.0
//!     }
//! }
//!
//! let mut tree = AttrTree::new("dogs", AttrTreeConfig::default());
//! tree.add_item(Dog("Ollie".into()), "bully.frenchy").unwrap();
//! assert_eq!(tree.lookup("Ollie").unwrap().0, "Ollie");
//! assert_eq!(tree.as_list()[0].0, "bully.frenchy.Ollie");
//! ```

mod error;
mod node;
mod render;

pub use error::{TreeError, TreeResult};
pub use node::{AttrTree, AttrTreeConfig, TreeEntry};

/// Something that can be stored as a tree leaf.
pub trait TreeItem {
    /// Leaf name.
    fn tree_name(&self) -> &str;

    /// One-line description shown in listings and help.
    fn tree_description(&self) -> Option<String> {
        None
    }
}

/// Group path of a tree entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy(Vec<String>);

impl Hierarchy {
    /// Path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the path of the root itself.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path extended with one more segment.
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.extend(Hierarchy::from(segment).0);
        Self(segments)
    }

    /// Dotted form.
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

impl From<&str> for Hierarchy {
    fn from(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<&String> for Hierarchy {
    fn from(path: &String) -> Self {
        Self::from(path.as_str())
    }
}

impl From<Vec<String>> for Hierarchy {
    fn from(segments: Vec<String>) -> Self {
        Self(segments.into_iter().filter(|s| !s.is_empty()).collect())
    }
}

impl From<&[&str]> for Hierarchy {
    fn from(segments: &[&str]) -> Self {
        Self(
            segments
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl std::fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dotted())
    }
}
