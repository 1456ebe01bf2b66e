//! Configuration management.
//!
//! Settings are read from the `[my]` table of `my.toml`, first in the site
//! configuration directory then in the user one, and finally overridden by
//! `MARV_YETI_*` environment variables.
//!
//! # Example
//!
//! ```no_run
//! use yeti::config::{EnvironmentLoader, SettingsLoader};
//!
//! let env = EnvironmentLoader::new(None);
//! let loader = SettingsLoader::new(&env).unwrap();
//!
//! println!("Plugin directories: {:?}", loader.settings.expanded_plugin_dirs());
//! ```

pub mod environment;
pub mod settings;

pub use self::environment::{EnvironmentLoader, ENV_PREFIX};
pub use self::settings::{
    read_settings_table, settings_files, site_config_dir, user_config_dir, user_settings_file,
    Settings, SettingsLoader, APP_NAME, DEFAULT_NOTIFY_COMMAND, SETTINGS_FILENAME, SETTINGS_TABLE,
};
