//! Settings loading from TOML files.

use super::environment::EnvironmentLoader;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name, used for configuration directories.
pub const APP_NAME: &str = "marvelous-yeti";

/// Settings file name inside each configuration directory.
pub const SETTINGS_FILENAME: &str = "my.toml";

/// Table holding the settings inside a settings file.
pub const SETTINGS_TABLE: &str = "my";

/// Default command used to send desktop notifications.
pub const DEFAULT_NOTIFY_COMMAND: &str = "notify-send {title} {body}";

/// Marvelous Yeti settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Verbose logging.
    pub debug: bool,
    /// Directories scanned for plugins.
    pub plugin_dirs: Vec<PathBuf>,
    /// Notification command; `{title}` and `{body}` are replaced, quoted.
    pub notify_command: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            plugin_dirs: user_config_dir()
                .map(|dir| vec![dir.join("plugins")])
                .unwrap_or_default(),
            notify_command: DEFAULT_NOTIFY_COMMAND.to_string(),
        }
    }
}

impl Settings {
    /// Apply environment overrides.
    pub fn apply_env(&mut self, env: &EnvironmentLoader) {
        if let Some(debug) = env.debug() {
            self.debug = debug;
        }
        if let Some(dirs) = env.plugin_dirs() {
            self.plugin_dirs = dirs;
        }
        if let Some(command) = env.notify_command() {
            self.notify_command = command;
        }
    }

    /// Plugin directories with `~` and environment variables expanded.
    pub fn expanded_plugin_dirs(&self) -> Vec<PathBuf> {
        self.plugin_dirs
            .iter()
            .map(|dir| {
                let raw = dir.to_string_lossy();
                match shellexpand::full(&raw) {
                    Ok(expanded) => PathBuf::from(expanded.into_owned()),
                    Err(_) => PathBuf::from(shellexpand::tilde(&raw).into_owned()),
                }
            })
            .collect()
    }
}

/// User configuration directory (`~/.config/marvelous-yeti` on Linux).
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Site-wide configuration directory.
pub fn site_config_dir() -> PathBuf {
    PathBuf::from("/etc/xdg").join(APP_NAME)
}

/// User settings file.
pub fn user_settings_file() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(SETTINGS_FILENAME))
}

/// Settings files in loading order: site first, then user.
pub fn settings_files() -> Vec<PathBuf> {
    let mut files = vec![site_config_dir().join(SETTINGS_FILENAME)];
    files.extend(user_settings_file());
    files
}

/// Read the settings table of a file, if it has one.
///
/// The table name is matched case-insensitively, so `[my]` and `[MY]` both
/// work.
pub fn read_settings_table(path: &Path) -> Result<Option<toml::Table>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {:?}", path))?;
    let document: toml::Table = toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file: {:?}", path))?;

    let table = document
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(SETTINGS_TABLE))
        .map(|(_, value)| match value {
            toml::Value::Table(table) => Ok(table),
            other => Err(anyhow::anyhow!(
                "[{}] in {:?} must be a table, found {}",
                SETTINGS_TABLE,
                path,
                other.type_str()
            )),
        })
        .transpose()?;
    Ok(table)
}

/// Loads [`Settings`] from settings files and the environment.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    /// Resolved settings.
    pub settings: Settings,
    /// Files that contributed to the settings.
    pub sources: Vec<PathBuf>,
}

impl SettingsLoader {
    /// Load from the site and user settings files, then the environment.
    pub fn new(env: &EnvironmentLoader) -> Result<Self> {
        Self::from_files(&settings_files(), env)
    }

    /// Load from `files`, in order, then the environment.
    ///
    /// Missing files are skipped; later files override earlier ones key by
    /// key.
    pub fn from_files(files: &[PathBuf], env: &EnvironmentLoader) -> Result<Self> {
        let mut merged = toml::Table::new();
        let mut sources = Vec::new();

        for file in files {
            if !file.is_file() {
                debug!("No settings file at {:?}", file);
                continue;
            }
            if let Some(table) = read_settings_table(file)? {
                for (key, value) in table {
                    merged.insert(key, value);
                }
            }
            sources.push(file.clone());
        }

        let mut settings: Settings = toml::Value::Table(merged)
            .try_into()
            .context("Invalid settings")?;
        settings.apply_env(env);
        debug!("Settings loaded from {:?}: {:?}", sources, settings);

        Ok(Self { settings, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env() -> EnvironmentLoader {
        EnvironmentLoader::from_vars(Vec::new())
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.debug);
        assert_eq!(settings.notify_command, DEFAULT_NOTIFY_COMMAND);
        if let Some(dir) = user_config_dir() {
            assert_eq!(settings.plugin_dirs, vec![dir.join("plugins")]);
        }
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let dir = TempDir::new().unwrap();
        let loader =
            SettingsLoader::from_files(&[dir.path().join("absent.toml")], &no_env()).unwrap();
        assert!(loader.sources.is_empty());
        assert_eq!(loader.settings, Settings::default());
    }

    #[test]
    fn test_later_files_override() {
        let dir = TempDir::new().unwrap();
        let site = write(
            &dir,
            "site.toml",
            "[my]\ndebug = true\nnotify_command = \"wall {body}\"\n",
        );
        let user = write(&dir, "user.toml", "[MY]\ndebug = false\n");

        let loader = SettingsLoader::from_files(&[site.clone(), user.clone()], &no_env()).unwrap();
        assert_eq!(loader.sources, vec![site, user]);
        assert!(!loader.settings.debug);
        assert_eq!(loader.settings.notify_command, "wall {body}");
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "my.toml", "[my]\nplugin_dirs = [\"/opt/yeti\"]\n");
        let env = EnvironmentLoader::from_vars(vec![
            ("MARV_YETI_PLUGIN_DIRS".to_string(), "/a:/b".to_string()),
            ("MARV_YETI_DEBUG".to_string(), "true".to_string()),
        ]);
        let loader = SettingsLoader::from_files(&[file], &env).unwrap();
        assert_eq!(
            loader.settings.plugin_dirs,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert!(loader.settings.debug);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.toml", "[my\n");
        assert!(SettingsLoader::from_files(&[bad], &no_env()).is_err());

        let wrong = write(&dir, "wrong.toml", "my = 3\n");
        assert!(read_settings_table(&wrong).is_err());

        let other = write(&dir, "other.toml", "[other]\nx = 1\n");
        assert!(read_settings_table(&other).unwrap().is_none());
    }

    #[test]
    fn test_expanded_plugin_dirs() {
        let settings = Settings {
            plugin_dirs: vec![PathBuf::from("~/plugins"), PathBuf::from("/abs")],
            ..Settings::default()
        };
        let dirs = settings.expanded_plugin_dirs();
        assert!(!dirs[0].to_string_lossy().starts_with('~'));
        assert_eq!(dirs[1], PathBuf::from("/abs"));
    }
}
