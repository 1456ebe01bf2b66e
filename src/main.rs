//! `my`: run the processes exposed by the installed plugins.

use std::ffi::OsString;
use std::process::exit;
use yeti::cli::{display_error_with_suggestions, App, CliError};
use yeti::config::{EnvironmentLoader, SettingsLoader};
use yeti::observability::init_logging;

fn main() {
    let argv: Vec<OsString> = std::env::args_os().collect();

    let env = EnvironmentLoader::new(None);
    let settings = match SettingsLoader::new(&env) {
        Ok(loader) => loader.settings,
        Err(e) => {
            init_logging(false);
            display_error_with_suggestions(&CliError::from(e), "Failed to load settings", None);
            exit(1);
        }
    };

    // Logging must be up before the plugins load, so the flag is read ahead
    // of the parser.
    let debug = settings.debug || argv.iter().any(|arg| arg == "--debug");
    init_logging(debug);

    let app = match App::load(settings) {
        Ok(app) => app,
        Err(e) => {
            display_error_with_suggestions(&e, "Failed to load plugins", None);
            exit(e.exit_code());
        }
    };

    if let Err(e) = app.run(argv) {
        display_error_with_suggestions(&e, "Process failed", None);
        exit(e.exit_code());
    }
}
