//! Parser construction for the `my` binary
//!
//! The parser is generated from the loaded plugins: one subcommand per
//! plugin, its process tree nested below, and every process leaf carrying
//! the shared run options followed by the process arguments.

use super::error::CliResult;
use crate::plugins::PluginLoader;
use clap::{Arg, ArgAction, Command, ValueHint};

// Shared option ids live under `__` so process fields cannot take them.

/// Id of the `--background` flag.
pub const BACKGROUND: &str = "__background";
/// Id of the `--output-file` option.
pub const OUTPUT_FILE: &str = "__output_file";
/// Id of the `--stdout` flag.
pub const STDOUT: &str = "__stdout";
/// Id of the `--debug-output` option.
pub const DEBUG_OUTPUT: &str = "__debug_output";

/// Spellings of the background flag, removed when re-executing.
pub const BACKGROUND_FLAGS: [&str; 2] = ["--background", "--bg"];

/// Add the options shared by every process subcommand.
pub fn process_options(command: Command) -> Command {
    command
        .arg(
            Arg::new(BACKGROUND)
                .long("background")
                .visible_alias("bg")
                .action(ArgAction::SetTrue)
                .help("Run the process in the background instead of waiting for completion"),
        )
        .arg(
            Arg::new(OUTPUT_FILE)
                .long("output-file")
                .visible_alias("out")
                .value_name("FILE")
                .value_hint(ValueHint::FilePath)
                .help("File to append the process output to"),
        )
        .arg(
            Arg::new(STDOUT)
                .long("stdout")
                .action(ArgAction::SetTrue)
                .help("Also print the output when writing it to a file"),
        )
        .arg(
            Arg::new(DEBUG_OUTPUT)
                .long("debug-output")
                .value_name("FILE")
                .value_hint(ValueHint::FilePath)
                .help("Where to write the stderr of the intermediate steps, '-' for stderr [default: discarded]"),
        )
}

/// Root parser without plugins.
pub fn base_command() -> Command {
    Command::new("my")
        .about("Run the processes exposed by Marvelous Yeti plugins")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Verbose logging"),
        )
        .arg(
            Arg::new("notify_on_error")
                .long("notify-on-error")
                .action(ArgAction::SetTrue)
                .help("Send a notification when the process fails"),
        )
        .arg(
            Arg::new("notify_on_success")
                .long("notify-on-success")
                .action(ArgAction::SetTrue)
                .help("Send a notification when the process succeeds"),
        )
}

/// Full parser of the `my` binary for the loaded plugins.
pub fn build_cli(loader: &PluginLoader) -> CliResult<Command> {
    let mut root = base_command();
    for (name, plugin) in loader.plugins() {
        if plugin.processes().is_empty() {
            continue;
        }
        let name: &'static str = Box::leak(name.clone().into_boxed_str());
        let about = format!("Processes of the {} plugin", plugin.name);
        let sub = Command::new(name)
            .about(about)
            .subcommand_required(true)
            .arg_required_else_help(true);
        root = root.subcommand(plugin.add_arguments(sub, &process_options)?);
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{Entrypoint, EntrypointObject, StaticSource};
    use crate::process::Process;

    fn loader() -> PluginLoader {
        let source = StaticSource::new()
            .with(Entrypoint::new(
                "net__ip",
                "net.processes",
                EntrypointObject::Process(Process::command("curl -s ifconfig.me")),
            ))
            .with(Entrypoint::new(
                "uptime",
                "sys.processes",
                EntrypointObject::Process(Process::command("uptime")),
            ));
        let mut loader = PluginLoader::new();
        loader.load_plugins(&[&source]).unwrap();
        loader
    }

    #[test]
    fn test_process_options() {
        let cmd = process_options(Command::new("leaf").no_binary_name(true));
        let m = cmd
            .try_get_matches_from(["--bg", "--out", "/tmp/o.txt", "--debug-output", "-"])
            .unwrap();
        assert!(m.get_flag(BACKGROUND));
        assert!(!m.get_flag(STDOUT));
        assert_eq!(m.get_one::<String>(OUTPUT_FILE).unwrap(), "/tmp/o.txt");
        assert_eq!(m.get_one::<String>(DEBUG_OUTPUT).unwrap(), "-");
    }

    #[test]
    fn test_build_cli_nests_plugins() {
        let cmd = build_cli(&loader()).unwrap();
        cmd.clone().debug_assert();

        let m = cmd
            .try_get_matches_from(["my", "--debug", "net", "net", "ip", "--stdout"])
            .unwrap();
        assert!(m.get_flag("debug"));
        let (plugin, m) = m.subcommand().unwrap();
        assert_eq!(plugin, "net");
        let (group, m) = m.subcommand().unwrap();
        assert_eq!(group, "net");
        let (leaf, m) = m.subcommand().unwrap();
        assert_eq!(leaf, "ip");
        assert!(m.get_flag(STDOUT));
    }

    #[test]
    fn test_group_requires_subcommand() {
        let cmd = build_cli(&loader()).unwrap();
        assert!(cmd.clone().try_get_matches_from(["my", "net"]).is_err());
        assert!(cmd.try_get_matches_from(["my", "sys", "uptime"]).is_ok());
    }
}
