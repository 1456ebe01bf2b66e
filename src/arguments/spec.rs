//! Argument specifications and their clap rendering
//!
//! An [`ArgumentSpec`] is computed fresh from a declaration every time it is
//! needed. [`ExposeArguments`] is the contract shared by everything that can
//! put arguments on a parser and take the parsed values back.

use super::declaration::Declaration;
use super::error::{ArgumentError, ArgumentResult};
use super::field::FieldDescriptor;
use super::policy::{value_to_plain_string, ArgAction, ArgumentPolicy, ParserOptions, ValueKind};
use clap::parser::ValueSource;
use clap::{Arg, ArgMatches, Command, ValueHint};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Parsed values keyed by field name.
pub type ProvidedValues = BTreeMap<String, ArgumentPolicy>;

/// Computed CLI shape of one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSpec {
    /// Names or flags; the first one is the displayed name.
    pub args: Vec<String>,
    /// Parser keyword options.
    pub options: ParserOptions,
    /// Never added to a parser.
    pub exclude: bool,
}

/// Replace underscores with dashes.
pub fn argslug(s: &str) -> String {
    s.replace('_', "-")
}

/// Turn a field or argument name into its long-flag form.
pub fn flag_name(name: &str) -> String {
    if name.starts_with('-') {
        argslug(name)
    } else {
        argslug(&format!("--{}", name))
    }
}

/// Flag spellings already taken on `command`, as `--long` and `-s`.
fn taken_flags(command: &Command) -> Vec<String> {
    let mut taken = Vec::new();
    if !command.is_disable_help_flag_set() {
        taken.extend(["--help".to_string(), "-h".to_string()]);
    }
    for arg in command.get_arguments() {
        taken.extend(arg.get_long().map(|long| format!("--{}", long)));
        taken.extend(arg.get_short().map(|short| format!("-{}", short)));
        for alias in arg.get_all_aliases().unwrap_or_default() {
            taken.push(format!("--{}", alias));
        }
        for alias in arg.get_all_short_aliases().unwrap_or_default() {
            taken.push(format!("-{}", alias));
        }
    }
    taken
}

/// Clap spelling of a flag name: single dash only for one character.
fn clap_flag(name: &str) -> String {
    match name.strip_prefix("--") {
        Some(_) => name.to_string(),
        None if name.chars().count() == 2 => name.to_string(),
        None => format!("-{}", name),
    }
}

fn leak(s: &str) -> &'static str {
    Box::leak(s.to_string().into_boxed_str())
}

impl ArgumentSpec {
    /// Positional when the displayed name is not a flag.
    pub fn is_positional(&self) -> bool {
        self.args
            .first()
            .map(|name| !name.starts_with('-'))
            .unwrap_or(true)
    }

    fn action(&self) -> ArgAction {
        self.options.action.unwrap_or(ArgAction::Store)
    }

    fn kind(&self) -> ValueKind {
        self.options.kind.unwrap_or(ValueKind::String)
    }

    /// Render a clap argument whose id is `id`.
    pub fn to_arg(&self, id: &str) -> Arg {
        let mut arg = Arg::new(leak(id));

        if self.is_positional() {
            arg = arg.required(self.options.required.unwrap_or(true));
        } else {
            let mut has_long = false;
            for name in &self.args {
                if let Some(long) = name.strip_prefix("--") {
                    arg = if has_long {
                        arg.visible_alias(leak(long))
                    } else {
                        arg.long(leak(long))
                    };
                    has_long = true;
                } else if let Some(short) = name.strip_prefix('-') {
                    let mut chars = short.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => arg = arg.short(c),
                        _ => {
                            arg = if has_long {
                                arg.visible_alias(leak(short))
                            } else {
                                arg.long(leak(short))
                            };
                            has_long = true;
                        }
                    }
                }
            }
            arg = arg.required(self.options.required.unwrap_or(false));
        }

        arg = match self.action() {
            ArgAction::Store => arg.action(clap::ArgAction::Set),
            ArgAction::StoreTrue => arg.action(clap::ArgAction::SetTrue),
            ArgAction::StoreFalse => arg.action(clap::ArgAction::SetFalse),
            ArgAction::Append => arg.action(clap::ArgAction::Append),
            ArgAction::Count => arg.action(clap::ArgAction::Count),
        };

        if let Some(metavar) = &self.options.metavar {
            if !self.action().is_flag() {
                arg = arg.value_name(leak(metavar));
            }
        }

        if let Some(choices) = &self.options.choices {
            let static_values: Vec<&'static str> = choices.iter().map(|c| leak(c)).collect();
            arg = arg.value_parser(static_values);
        }

        if self.kind() == ValueKind::Path {
            arg = arg.value_hint(ValueHint::AnyPath);
        }

        let mut help = self.options.help.clone().unwrap_or_default();
        if let Some(default) = &self.options.default {
            if !self.action().is_flag() && !default.is_null() {
                if !help.is_empty() {
                    help.push(' ');
                }
                help.push_str(&format!("[default: {}]", value_to_plain_string(default)));
            }
        }
        if !help.is_empty() {
            arg = arg.help(help);
        }

        arg
    }

    /// Read the value parsed for `id` back as a JSON value.
    ///
    /// An argument absent from the command line yields its default, or
    /// `null` when it has none.
    pub fn extract(&self, id: &str, matches: &ArgMatches) -> ArgumentResult<Value> {
        let extraction = |e: clap::parser::MatchesError| ArgumentError::Extraction {
            field: id.to_string(),
            reason: e.to_string(),
        };

        // Ids never added to the parser read as absent.
        let known = matches.try_contains_id(id).is_ok();
        let from_command_line =
            known && matches!(matches.value_source(id), Some(ValueSource::CommandLine));
        if !from_command_line {
            let fallback = match self.action() {
                ArgAction::StoreTrue => Value::Bool(false),
                ArgAction::StoreFalse => Value::Bool(true),
                ArgAction::Count => Value::from(0),
                ArgAction::Append | ArgAction::Store => Value::Null,
            };
            return Ok(self.options.default.clone().unwrap_or(fallback));
        }

        match self.action() {
            ArgAction::StoreTrue | ArgAction::StoreFalse => {
                let flag = matches.try_get_one::<bool>(id).map_err(extraction)?;
                Ok(Value::Bool(flag.copied().unwrap_or(false)))
            }
            ArgAction::Count => {
                let count = matches.try_get_one::<u8>(id).map_err(extraction)?;
                Ok(Value::from(count.copied().unwrap_or(0)))
            }
            ArgAction::Append => {
                let raw = matches.try_get_many::<String>(id).map_err(extraction)?;
                let values = raw
                    .into_iter()
                    .flatten()
                    .map(|r| self.parse_raw(id, r))
                    .collect::<ArgumentResult<Vec<_>>>()?;
                Ok(Value::Array(values))
            }
            ArgAction::Store => match matches.try_get_one::<String>(id).map_err(extraction)? {
                Some(raw) => self.parse_raw(id, raw),
                None => Ok(self.options.default.clone().unwrap_or(Value::Null)),
            },
        }
    }

    fn parse_raw(&self, id: &str, raw: &str) -> ArgumentResult<Value> {
        self.kind()
            .parse(raw)
            .map_err(|reason| ArgumentError::InvalidValue {
                field: id.to_string(),
                value: raw.to_string(),
                reason,
            })
    }
}

/// Read the parsed values of every non-excluded spec.
///
/// Specs sharing an id read the same value.
pub fn extract_values<'a, I>(specs: I, matches: &ArgMatches) -> ArgumentResult<ProvidedValues>
where
    I: IntoIterator<Item = &'a (String, ArgumentSpec)>,
{
    let mut provided = ProvidedValues::new();
    for (id, spec) in specs {
        if spec.exclude || provided.contains_key(id) {
            continue;
        }
        let value = spec.extract(id, matches)?;
        provided.insert(id.clone(), ArgumentPolicy::Fixed(value));
    }
    Ok(provided)
}

/// Which exposable fields end up on the parser.
#[derive(Clone, Copy)]
pub enum IncludeFields<'a> {
    /// Every exposable field.
    All,
    /// No field at all.
    Nothing,
    /// Fields accepted by the predicate.
    Matching(&'a dyn Fn(&Declaration, &FieldDescriptor) -> bool),
}

impl IncludeFields<'_> {
    /// Apply the filter to one field.
    pub fn includes(&self, declaration: &Declaration, field: &FieldDescriptor) -> bool {
        match self {
            IncludeFields::All => true,
            IncludeFields::Nothing => false,
            IncludeFields::Matching(predicate) => predicate(declaration, field),
        }
    }
}

impl std::fmt::Debug for IncludeFields<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncludeFields::All => write!(f, "All"),
            IncludeFields::Nothing => write!(f, "Nothing"),
            IncludeFields::Matching(_) => write!(f, "Matching(..)"),
        }
    }
}

/// Something that exposes its fields as command-line arguments.
pub trait ExposeArguments {
    /// Flattened specs of this value and of everything nested in it.
    fn argument_specs(&self, include: IncludeFields<'_>) -> ArgumentResult<Vec<(String, ArgumentSpec)>>;

    /// New value with parsed arguments applied.
    fn with_arguments(&self, values: &ProvidedValues) -> ArgumentResult<Self>
    where
        Self: Sized;

    /// Add the arguments to a clap command.
    ///
    /// Excluded specs are skipped, as are specs whose id is already on the
    /// command. Flag spellings the command already uses are dropped from a
    /// spec; a flag left with no spelling is skipped.
    fn add_arguments(&self, mut command: Command, include: IncludeFields<'_>) -> ArgumentResult<Command> {
        for (id, mut spec) in self.argument_specs(include)? {
            if spec.exclude {
                continue;
            }
            if command.get_arguments().any(|a| a.get_id().as_str() == id) {
                debug!("Argument '{}' already exposed, skipping duplicate", id);
                continue;
            }
            if !spec.is_positional() {
                let taken = taken_flags(&command);
                let (free, clashing): (Vec<String>, Vec<String>) = spec
                    .args
                    .into_iter()
                    .partition(|name| !taken.contains(&clap_flag(name)));
                if !clashing.is_empty() {
                    warn!("Argument '{}': {:?} already used, dropping them", id, clashing);
                }
                if free.is_empty() {
                    warn!("Argument '{}' has no free flag, not exposed", id);
                    continue;
                }
                spec.args = free;
            }
            command = command.arg(spec.to_arg(&id));
        }
        Ok(command)
    }

    /// Read back the values parsed for the arguments added by
    /// [`add_arguments`](Self::add_arguments).
    fn extract_arguments(&self, matches: &ArgMatches, include: IncludeFields<'_>) -> ArgumentResult<ProvidedValues> {
        let specs = self.argument_specs(include)?;
        extract_values(&specs, matches)
    }
}

impl ExposeArguments for Declaration {
    fn argument_specs(&self, include: IncludeFields<'_>) -> ArgumentResult<Vec<(String, ArgumentSpec)>> {
        Ok(self.arguments(include)?.into_iter().collect())
    }

    fn with_arguments(&self, values: &ProvidedValues) -> ArgumentResult<Self> {
        Declaration::with_arguments(self, values)
    }
}
