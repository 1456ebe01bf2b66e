//! Running the process selected on the command line

use super::builder::{self, BACKGROUND, BACKGROUND_FLAGS, DEBUG_OUTPUT, OUTPUT_FILE, STDOUT};
use super::error::{CliError, CliResult};
use super::notify::Notifier;
use super::router::{route, Route};
use crate::arguments::{ExposeArguments, IncludeFields};
use crate::config::Settings;
use crate::plugins::{ManifestSource, PluginLoader};
use crate::process::{Output, Process, RunContext, StderrMode, StdinMode};
use clap::{ArgMatches, Command};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{debug, info};

/// Prefix of output lines printed on stdout.
pub const STDOUT_PREFIX: &str = ">>> ";

/// Options shared by every process subcommand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Detach and return immediately.
    pub background: bool,
    /// Append output lines to this file instead of stdout.
    pub output_file: Option<PathBuf>,
    /// Echo output lines on stdout as well when writing a file.
    pub stdout: bool,
    /// Stderr of the children; `-` keeps the caller's stderr.
    pub debug_output: Option<String>,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl RunOptions {
    /// Read the options from the matches of a process subcommand.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            background: matches.get_flag(BACKGROUND),
            output_file: matches.get_one::<String>(OUTPUT_FILE).map(|p| expand(p)),
            stdout: matches.get_flag(STDOUT),
            debug_output: matches.get_one::<String>(DEBUG_OUTPUT).cloned(),
        }
    }

    /// Where the stderr of every child goes.
    pub fn stderr_mode(&self) -> StderrMode {
        match self.debug_output.as_deref() {
            None => StderrMode::Null,
            Some("-") => StderrMode::Inherit,
            Some(path) => StderrMode::File(expand(path)),
        }
    }

    /// Context of the run.
    pub fn run_context(&self) -> RunContext {
        RunContext {
            stdin: StdinMode::Inherit,
            stderr: self.stderr_mode(),
        }
    }

    fn open_output_file(&self) -> CliResult<Option<File>> {
        match &self.output_file {
            Some(path) => Ok(Some(OpenOptions::new().create(true).append(true).open(path)?)),
            None => Ok(None),
        }
    }
}

/// Apply the values parsed for `process` to it.
pub fn prepare(process: &Process, matches: &ArgMatches) -> CliResult<Process> {
    let values = process.extract_arguments(matches, IncludeFields::All)?;
    debug!("Parsed values: {:?}", values);
    Ok(process.with_arguments(&values)?)
}

/// Write the output lines where the options say.
///
/// Lines go to the output file when there is one, and to `stdout` with
/// [`STDOUT_PREFIX`] otherwise or when echoing. Returns the number of lines.
pub fn write_output<W: Write>(output: Output, options: &RunOptions, stdout: &mut W) -> CliResult<usize> {
    let mut file = options.open_output_file()?;
    let mut count = 0;
    for line in output {
        let line = line?;
        match file.as_mut() {
            Some(file) => {
                writeln!(file, "{}", line)?;
                if options.stdout {
                    writeln!(stdout, "{}{}", STDOUT_PREFIX, line)?;
                }
            }
            None => writeln!(stdout, "{}{}", STDOUT_PREFIX, line)?,
        }
        count += 1;
    }
    stdout.flush()?;
    Ok(count)
}

/// Prepare and run `process`, writing its output.
pub fn run_process<W: Write>(
    process: &Process,
    matches: &ArgMatches,
    options: &RunOptions,
    stdout: &mut W,
) -> CliResult<usize> {
    let prepared = prepare(process, matches)?;
    info!("Running {}", prepared);
    let output = prepared.run(&options.run_context())?;
    write_output(output, options, stdout)
}

/// Command line re-running `argv` without the background flags.
///
/// The child reads nothing; its stdout and stderr go to the output file,
/// or nowhere without one.
pub fn background_command(
    program: &Path,
    argv: &[OsString],
    options: &RunOptions,
) -> CliResult<std::process::Command> {
    let mut command = std::process::Command::new(program);
    command.args(
        argv.iter()
            .skip(1)
            .filter(|arg| !BACKGROUND_FLAGS.iter().any(|flag| arg.as_os_str() == *flag)),
    );
    command.stdin(Stdio::null());
    match options.open_output_file()? {
        Some(file) => {
            let err = file.try_clone()?;
            command.stdout(Stdio::from(file)).stderr(Stdio::from(err));
        }
        None => {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }
    }
    Ok(command)
}

/// Re-execute the current command line in the background.
///
/// Returns the pid of the detached child.
pub fn spawn_background(argv: &[OsString], options: &RunOptions) -> CliResult<u32> {
    let program = std::env::current_exe()?;
    let child = background_command(&program, argv, options)?.spawn()?;
    info!("Started background process {}", child.id());
    Ok(child.id())
}

/// The `my` application: settings plus loaded plugins.
#[derive(Debug, Clone)]
pub struct App {
    /// Resolved settings.
    pub settings: Settings,
    /// Loaded plugins.
    pub loader: PluginLoader,
}

impl App {
    /// Load the plugins found in the configured plugin directories.
    pub fn load(settings: Settings) -> CliResult<Self> {
        let dirs = settings.expanded_plugin_dirs();
        debug!("Plugin directories: {:?}", dirs);
        let source = ManifestSource::scan(&dirs);
        let mut loader = PluginLoader::new();
        loader.load_plugins(&[&source])?;
        Ok(Self::new(settings, loader))
    }

    /// Application over already loaded plugins.
    pub fn new(settings: Settings, loader: PluginLoader) -> Self {
        Self { settings, loader }
    }

    /// Parser for the loaded plugins.
    pub fn command(&self) -> CliResult<Command> {
        builder::build_cli(&self.loader)
    }

    /// Process the route points at.
    pub fn resolve(&self, route: &Route<'_>) -> CliResult<&Process> {
        let plugin = self.loader.plugin(&route.plugin)?;
        plugin
            .processes()
            .item(route.path.clone())
            .map(|external| &external.process)
            .ok_or_else(|| CliError::UnknownProcess {
                plugin: route.plugin.clone(),
                path: route.function_name(),
            })
    }

    /// Run the process selected by `matches`.
    ///
    /// `argv` is the full command line, needed to re-execute it in the
    /// background.
    pub fn dispatch<W: Write>(&self, matches: &ArgMatches, argv: &[OsString], stdout: &mut W) -> CliResult<()> {
        let route = route(matches).ok_or(CliError::NoProcess)?;
        let process = self.resolve(&route)?;
        let options = RunOptions::from_matches(route.matches);

        let title = format!("my {} {}", route.plugin, route.path.join(" "));
        let notifier = Notifier::new(self.settings.notify_command.clone());

        if options.background {
            spawn_background(argv, &options)?;
            return Ok(());
        }

        match run_process(process, route.matches, &options, stdout) {
            Ok(count) => {
                debug!("{} produced {} lines", title, count);
                if matches.get_flag("notify_on_success") {
                    notifier.notify(&title, "Process finished");
                }
                Ok(())
            }
            Err(e) => {
                if matches.get_flag("notify_on_error") {
                    notifier.notify(&title, &format!("Process failed: {}", e));
                }
                Err(e)
            }
        }
    }

    /// Parse `argv` and run the selected process on the real stdout.
    ///
    /// Help, version and parse errors exit the program the way clap does.
    pub fn run(&self, argv: Vec<OsString>) -> CliResult<()> {
        let matches = self.command()?.get_matches_from(argv.clone());
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.dispatch(&matches, &argv, &mut lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Declaration, FieldDescriptor, Schema, REQUIRED_ARGUMENT};
    use crate::plugins::{Entrypoint, EntrypointObject, StaticSource};
    use crate::process::CommandProcess;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn app(notify_command: &str) -> App {
        let source = StaticSource::new()
            .with(Entrypoint::new(
                "greet",
                "demo.processes",
                EntrypointObject::Process(Process::command("printf 'hello\\nworld\\n'")),
            ))
            .with(Entrypoint::new(
                "tools__fail",
                "demo.processes",
                EntrypointObject::Process(Process::command("exit 2")),
            ));
        let mut loader = PluginLoader::new();
        loader.load_plugins(&[&source]).unwrap();
        let settings = Settings {
            notify_command: notify_command.to_string(),
            ..Settings::default()
        };
        App::new(settings, loader)
    }

    fn argv(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    fn dispatch(app: &App, args: &[&str]) -> (CliResult<()>, String) {
        let argv = argv(args);
        let matches = app.command().unwrap().try_get_matches_from(&argv).unwrap();
        let mut out = Vec::new();
        let result = app.dispatch(&matches, &argv, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_stdout_prefix() {
        let (result, out) = dispatch(&app("true"), &["my", "demo", "greet"]);
        result.unwrap();
        assert_eq!(out, ">>> hello\n>>> world\n");
    }

    #[test]
    fn test_output_file_appends() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("out.txt");
        std::fs::write(&file, "previous\n").unwrap();
        let path = file.to_str().unwrap();

        let (result, out) = dispatch(&app("true"), &["my", "demo", "greet", "--out", path]);
        result.unwrap();
        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "previous\nhello\nworld\n");

        let (result, out) =
            dispatch(&app("true"), &["my", "demo", "greet", "--output-file", path, "--stdout"]);
        result.unwrap();
        assert_eq!(out, ">>> hello\n>>> world\n");
    }

    #[test]
    fn test_failure_and_notification() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("notified");
        let app = app(&format!("echo {{title}} >> {}", log.display()));

        let (result, _) = dispatch(&app, &["my", "--notify-on-error", "demo", "tools", "fail"]);
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "my demo tools fail\n");

        let (result, _) = dispatch(&app, &["my", "--notify-on-success", "demo", "greet"]);
        result.unwrap();
        assert_eq!(
            std::fs::read_to_string(&log).unwrap(),
            "my demo tools fail\nmy demo greet\n"
        );
    }

    #[test]
    fn test_field_named_like_a_run_option() {
        let schema = Arc::new(Schema::new("Tee").field(FieldDescriptor::new("stdout")));
        let decl = Declaration::new(schema, [("stdout", REQUIRED_ARGUMENT)]).unwrap();
        let tee: Process = CommandProcess::new(decl, "echo {stdout}").unwrap().into();
        let source = StaticSource::new().with(Entrypoint::new(
            "tee",
            "demo.processes",
            EntrypointObject::Process(tee),
        ));
        let mut loader = PluginLoader::new();
        loader.load_plugins(&[&source]).unwrap();
        let app = App::new(Settings::default(), loader);
        app.command().unwrap().debug_assert();

        let (result, out) = dispatch(&app, &["my", "demo", "tee", "hello"]);
        result.unwrap();
        assert_eq!(out, ">>> hello\n");

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("out.txt");
        let path = file.to_str().unwrap();
        let (result, out) = dispatch(&app, &["my", "demo", "tee", "hi", "--out", path, "--stdout"]);
        result.unwrap();
        assert_eq!(out, ">>> hi\n");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "hi\n");
    }

    #[test]
    fn test_stderr_modes() {
        let mut options = RunOptions::default();
        assert_eq!(options.stderr_mode(), StderrMode::Null);
        options.debug_output = Some("-".to_string());
        assert_eq!(options.stderr_mode(), StderrMode::Inherit);
        options.debug_output = Some("/tmp/debug.log".to_string());
        assert_eq!(
            options.stderr_mode(),
            StderrMode::File(PathBuf::from("/tmp/debug.log"))
        );
    }

    #[test]
    fn test_background_command_drops_flags() {
        let options = RunOptions {
            background: true,
            ..RunOptions::default()
        };
        let args = argv(&["my", "demo", "--bg", "greet", "--background"]);
        let command = background_command(Path::new("/usr/bin/my"), &args, &options).unwrap();
        let rest: Vec<_> = command.get_args().collect();
        assert_eq!(rest, vec!["demo", "greet"]);
        assert_eq!(command.get_program(), "/usr/bin/my");
    }
}
