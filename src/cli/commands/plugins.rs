//! `my-plugins` command implementation

use crate::cli::error::CliResult;
use crate::plugins::PluginLoader;
use clap::{Arg, ArgAction, Command};
use std::io::Write;

/// Parser of the `my-plugins` binary.
pub fn command() -> Command {
    Command::new("my-plugins")
        .about("List the loaded plugins with their processes and commands")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the listing as JSON"),
        )
}

/// Write the listing of every plugin.
pub fn list_plugins<W: Write>(loader: &PluginLoader, json: bool, out: &mut W) -> CliResult<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&loader.as_dict())?)?;
        return Ok(());
    }

    for (name, plugin) in loader.plugins() {
        writeln!(out, "For plugin '{}' ({})", name, plugin.module)?;
        writeln!(out, "# Processes:")?;
        let mut tree = String::new();
        plugin.processes().render(&mut tree, 1);
        write!(out, "{}", tree)?;
        writeln!(out)?;
        writeln!(out, "# Commands:")?;
        let mut tree = String::new();
        plugin.commands().render(&mut tree, 1);
        write!(out, "{}", tree)?;
        writeln!(out)?;
    }
    Ok(())
}
