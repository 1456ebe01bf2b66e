//! Shared utility functions for CLI commands

use super::error::CliError;
use crate::plugins::PluginError;
use crate::tree::TreeError;
use colored::*;

/// Suggestions shown under an error, if any apply.
pub fn suggestions_for(error: &CliError, app: &str) -> Vec<String> {
    match error {
        CliError::Plugin(PluginError::UnknownPlugin(_)) | CliError::UnknownProcess { .. } => vec![
            "Run 'my-plugins' to see the loaded plugins and their processes".to_string(),
            format!("Run '{} --help' to see the available subcommands", app),
        ],
        CliError::Plugin(PluginError::Tree(TreeError::Ambiguous { candidates, .. })) => candidates
            .iter()
            .map(|candidate| format!("Did you mean '{}'?", candidate))
            .collect(),
        CliError::Plugin(PluginError::Tree(TreeError::NameCollision { .. })) => vec![
            "Two plugin entries use the same name at different levels".to_string(),
            "Rename one of the entrypoints in its plugin.toml".to_string(),
        ],
        CliError::ConfigMissing(_) => vec!["Run 'my-config init' to create it".to_string()],
        CliError::Config(_) => vec![
            "Check the [my] table of your my.toml".to_string(),
            "Run 'my-config show' to print it".to_string(),
        ],
        CliError::Process(e) if e.exit_status().is_some() => vec![
            "Use '--debug-output -' to see the stderr of every step".to_string(),
        ],
        _ => Vec::new(),
    }
}

/// Display a user-friendly error message with suggestions
pub fn display_error_with_suggestions(error: &CliError, context: &str, app_name: Option<&str>) {
    let app = app_name.unwrap_or("my");

    eprintln!("{} {}", "❌ Error:".red().bold(), context);
    eprintln!("   {}", error.to_string().red());

    let suggestions = suggestions_for(error, app);
    if !suggestions.is_empty() {
        eprintln!("{}", "💡 Suggestions:".blue());
        for suggestion in suggestions {
            eprintln!("   • {}", suggestion);
        }
    }
}

/// Print a section title the way the listings do.
pub fn print_heading(title: &str) {
    println!("{}", title.cyan().bold());
}
