//! `my-config`: create and print the user configuration.

use std::process::exit;
use yeti::cli::commands::config::{command, init_config, show_config};
use yeti::cli::{display_error_with_suggestions, CliError};
use yeti::config::{user_config_dir, user_settings_file};
use yeti::observability::init_logging;

fn main() {
    init_logging(false);

    let mut parser = command();
    let matches = parser.clone().get_matches();

    let result = match matches.subcommand_name() {
        Some("init") => user_config_dir()
            .ok_or_else(|| CliError::Config("No configuration directory on this system".to_string()))
            .and_then(|dir| init_config(&dir))
            .map(|conf| println!("Configuration created at {}", conf.display())),
        Some("show") => user_settings_file()
            .ok_or_else(|| CliError::Config("No configuration directory on this system".to_string()))
            .and_then(|conf| show_config(&conf, &mut std::io::stdout())),
        _ => {
            println!("{}", parser.render_usage());
            exit(1);
        }
    };

    if let Err(e) = result {
        match e {
            CliError::ConfigExists(_) | CliError::ConfigIsDirectory(_) => println!("{}", e),
            _ => display_error_with_suggestions(&e, "my-config failed", Some("my-config")),
        }
        exit(1);
    }
}
