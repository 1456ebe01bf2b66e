//! `my-plugins`: list what the installed plugins expose.

use std::process::exit;
use yeti::cli::commands::plugins::{command, list_plugins};
use yeti::cli::{display_error_with_suggestions, App, CliError};
use yeti::config::{EnvironmentLoader, SettingsLoader};
use yeti::observability::init_logging;

fn main() {
    let matches = command().get_matches();

    let env = EnvironmentLoader::new(None);
    let result = SettingsLoader::new(&env)
        .map_err(CliError::from)
        .and_then(|loader| {
            init_logging(loader.settings.debug);
            App::load(loader.settings)
        })
        .and_then(|app| list_plugins(&app.loader, matches.get_flag("json"), &mut std::io::stdout()));

    if let Err(e) = result {
        display_error_with_suggestions(&e, "Failed to list plugins", Some("my-plugins"));
        exit(e.exit_code());
    }
}
