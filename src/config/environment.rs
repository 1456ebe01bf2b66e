//! Environment variable loading and management.
//!
//! Every setting of the `[my]` table can be overridden by a variable named
//! after it with the `MARV_YETI_` prefix.

use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "MARV_YETI_";

/// Reads `MARV_YETI_*` overrides, optionally from a `.env` file first.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<PathBuf>,
    vars: Vec<(String, String)>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to a .env file loaded before reading variables.
    ///   Nothing is loaded when None.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    warn!("Failed to load .env file {:?}: {}", path, e);
                }
            }
        }

        Self::from_vars_with_file(env::vars(), env_file)
    }

    /// Build from explicit variables instead of the process environment.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::from_vars_with_file(vars, None)
    }

    fn from_vars_with_file<I>(vars: I, env_file: Option<&Path>) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            env_file: env_file.map(Path::to_path_buf),
            vars: vars
                .into_iter()
                .filter(|(key, _)| key.starts_with(ENV_PREFIX))
                .collect(),
        }
    }

    /// The .env file given at construction.
    pub fn env_file(&self) -> Option<&Path> {
        self.env_file.as_deref()
    }

    /// Raw value of `MARV_YETI_<name>`; `name` is case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = format!("{}{}", ENV_PREFIX, name.to_uppercase());
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `MARV_YETI_DEBUG` as a boolean.
    pub fn debug(&self) -> Option<bool> {
        self.get("debug").and_then(|v| match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            other => {
                warn!("Ignoring {}DEBUG={}: not a boolean", ENV_PREFIX, other);
                None
            }
        })
    }

    /// `MARV_YETI_PLUGIN_DIRS`, split like `PATH`.
    pub fn plugin_dirs(&self) -> Option<Vec<PathBuf>> {
        self.get("plugin_dirs")
            .map(|v| env::split_paths(v).filter(|p| !p.as_os_str().is_empty()).collect())
    }

    /// `MARV_YETI_NOTIFY_COMMAND`.
    pub fn notify_command(&self) -> Option<String> {
        self.get("notify_command").map(str::to_string)
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
