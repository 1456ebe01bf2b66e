//! `my-config` command implementation

use crate::cli::error::{CliError, CliResult};
use crate::config::{read_settings_table, SETTINGS_FILENAME};
use clap::Command;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Parser of the `my-config` binary.
pub fn command() -> Command {
    Command::new("my-config")
        .about("Handle config for Marvelous Yeti and plugins")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create an empty user configuration file"))
        .subcommand(Command::new("show").about("Print the [my] table of the user configuration"))
}

/// Create an empty settings file in `conf_dir`, creating the directory.
///
/// Fails if the file already exists or is a directory.
pub fn init_config(conf_dir: &Path) -> CliResult<PathBuf> {
    let conf = conf_dir.join(SETTINGS_FILENAME);
    if !conf_dir.exists() {
        fs::create_dir_all(conf_dir)?;
    }

    if conf.is_dir() {
        return Err(CliError::ConfigIsDirectory(conf));
    }
    if conf.exists() {
        return Err(CliError::ConfigExists(conf));
    }
    fs::File::create(&conf)?;
    Ok(conf)
}

/// Print the settings table of `conf` as TOML.
pub fn show_config<W: Write>(conf: &Path, out: &mut W) -> CliResult<()> {
    if !conf.is_file() {
        return Err(CliError::ConfigMissing(conf.to_path_buf()));
    }
    let table = read_settings_table(conf)?.unwrap_or_default();
    write!(out, "{}", toml::to_string_pretty(&table)?)?;
    Ok(())
}
