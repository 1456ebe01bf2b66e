//! Mapping parsed subcommands back to processes

use clap::ArgMatches;

/// The process selected on the command line.
#[derive(Debug, Clone)]
pub struct Route<'a> {
    /// Plugin name.
    pub plugin: String,
    /// Groups and leaf name below the plugin.
    pub path: Vec<String>,
    /// Matches of the leaf subcommand.
    pub matches: &'a ArgMatches,
}

impl Route<'_> {
    /// Dotted process path, as given to [`Plugin::process`](crate::plugins::Plugin::process).
    pub fn function_name(&self) -> String {
        self.path.join(".")
    }
}

/// Follow the subcommand chain down to the leaf.
///
/// Returns `None` when no plugin subcommand was given.
pub fn route(matches: &ArgMatches) -> Option<Route<'_>> {
    let (plugin, mut current) = matches.subcommand()?;
    let mut path = Vec::new();
    while let Some((name, sub)) = current.subcommand() {
        path.push(name.to_string());
        current = sub;
    }
    Some(Route {
        plugin: plugin.to_string(),
        path,
        matches: current,
    })
}
