//! Argument policies and parser options
//!
//! A field of a [`Declaration`](super::Declaration) holds an
//! [`ArgumentPolicy`]: either a concrete value or one of the sentinels that
//! drive how the field is exposed on the command line.

use super::error::{ArgumentError, ArgumentResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a raw command-line string is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Kept as a string.
    String,
    /// Signed 64-bit integer.
    #[serde(alias = "int")]
    Integer,
    /// 64-bit float.
    Float,
    /// `true/false`, `yes/no`, `1/0`.
    #[serde(alias = "boolean")]
    Bool,
    /// Filesystem path, tilde-expanded when rendered.
    Path,
    /// Arbitrary JSON document.
    Json,
}

impl ValueKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Path => "path",
            ValueKind::Json => "json",
        }
    }

    /// Parse a kind name as written in manifests or parser options.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" | "str" => Some(ValueKind::String),
            "integer" | "int" => Some(ValueKind::Integer),
            "float" => Some(ValueKind::Float),
            "bool" | "boolean" => Some(ValueKind::Bool),
            "path" | "file" | "dir" => Some(ValueKind::Path),
            "json" => Some(ValueKind::Json),
            _ => None,
        }
    }

    /// Convert a raw command-line string into a value of this kind.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        match self {
            ValueKind::String | ValueKind::Path => Ok(Value::String(raw.to_string())),
            ValueKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| e.to_string()),
            ValueKind::Float => {
                let f = raw.trim().parse::<f64>().map_err(|e| e.to_string())?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("{} is not a finite number", raw))
            }
            ValueKind::Bool => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "on" => Ok(Value::Bool(true)),
                "false" | "no" | "n" | "0" | "off" => Ok(Value::Bool(false)),
                other => Err(format!("'{}' is not a boolean", other)),
            },
            ValueKind::Json => serde_json::from_str(raw).map_err(|e| e.to_string()),
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the parser does when it meets the argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgAction {
    /// Store the single value.
    Store,
    /// Flag storing `true` when present.
    StoreTrue,
    /// Flag storing `false` when present.
    StoreFalse,
    /// Collect every occurrence in a list.
    Append,
    /// Count occurrences.
    Count,
}

impl ArgAction {
    /// Parse an action name as written in manifests or parser options.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "store" => Some(ArgAction::Store),
            "store_true" => Some(ArgAction::StoreTrue),
            "store_false" => Some(ArgAction::StoreFalse),
            "append" => Some(ArgAction::Append),
            "count" => Some(ArgAction::Count),
            _ => None,
        }
    }

    /// Whether the action takes no value on the command line.
    pub fn is_flag(&self) -> bool {
        matches!(self, ArgAction::StoreTrue | ArgAction::StoreFalse | ArgAction::Count)
    }
}

/// Parser keyword options of a single argument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserOptions {
    /// Value used when the argument is absent.
    pub default: Option<Value>,
    /// Explicit required flag.
    pub required: Option<bool>,
    /// Conversion applied to raw values.
    pub kind: Option<ValueKind>,
    /// Destination field. Only the exposition engine sets it.
    pub(crate) dest: Option<String>,
    /// Name displayed in usage for the value.
    pub metavar: Option<String>,
    /// Allowed raw values.
    pub choices: Option<Vec<String>>,
    /// Help text.
    pub help: Option<String>,
    /// Parser action.
    pub action: Option<ArgAction>,
}

impl ParserOptions {
    /// Empty options.
    pub const fn new() -> Self {
        Self {
            default: None,
            required: None,
            kind: None,
            dest: None,
            metavar: None,
            choices: None,
            help: None,
            action: None,
        }
    }

    /// Destination chosen by the exposition engine, if any.
    pub fn dest(&self) -> Option<&str> {
        self.dest.as_deref()
    }

    /// Set an option by keyword.
    ///
    /// Accepted keys: `default`, `required`, `type` (or `kind`), `metavar`,
    /// `choices`, `help`, `action`. Setting `dest` always fails.
    pub fn set(&mut self, key: &str, value: Value) -> ArgumentResult<()> {
        let invalid = |reason: &str| ArgumentError::InvalidOption {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        match key {
            "dest" => return Err(ArgumentError::DestOverride),
            "default" => self.default = Some(value),
            "required" => {
                self.required = Some(value.as_bool().ok_or_else(|| invalid("expected a boolean"))?)
            }
            "type" | "kind" => {
                let name = value.as_str().ok_or_else(|| invalid("expected a type name"))?;
                self.kind = Some(
                    ValueKind::from_name(name).ok_or_else(|| invalid("unknown type name"))?,
                );
            }
            "metavar" => {
                self.metavar = Some(value.as_str().ok_or_else(|| invalid("expected a string"))?.to_string())
            }
            "help" => {
                self.help = Some(value.as_str().ok_or_else(|| invalid("expected a string"))?.to_string())
            }
            "choices" => {
                let items = value.as_array().ok_or_else(|| invalid("expected a list"))?;
                self.choices = Some(items.iter().map(value_to_plain_string).collect());
            }
            "action" => {
                let name = value.as_str().ok_or_else(|| invalid("expected an action name"))?;
                self.action = Some(
                    ArgAction::from_name(name).ok_or_else(|| invalid("unknown action"))?,
                );
            }
            other => return Err(ArgumentError::UnknownOption(other.to_string())),
        }
        Ok(())
    }

    /// Overwrite every option that `other` sets.
    pub fn merge(&mut self, other: &ParserOptions) {
        if other.default.is_some() {
            self.default = other.default.clone();
        }
        if other.required.is_some() {
            self.required = other.required;
        }
        if other.kind.is_some() {
            self.kind = other.kind;
        }
        if other.dest.is_some() {
            self.dest = other.dest.clone();
        }
        if other.metavar.is_some() {
            self.metavar = other.metavar.clone();
        }
        if other.choices.is_some() {
            self.choices = other.choices.clone();
        }
        if other.help.is_some() {
            self.help = other.help.clone();
        }
        if other.action.is_some() {
            self.action = other.action;
        }
    }

    /// True when no option is set.
    pub fn is_empty(&self) -> bool {
        *self == ParserOptions::new()
    }
}

/// Positional names/flags and keyword options carried by a parameterised
/// sentinel or attached to a field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgOptions {
    /// Argument names or flags (`"name"`, `"--flag"`, `"-f"`).
    pub args: Vec<String>,
    /// Keyword options.
    pub options: ParserOptions,
}

impl ArgOptions {
    /// No names and no options.
    pub const fn new() -> Self {
        Self {
            args: Vec::new(),
            options: ParserOptions::new(),
        }
    }

    /// Build from a JSON-like table of options.
    ///
    /// The `args` key holds the names, every other key is a parser option.
    pub fn from_map(map: &serde_json::Map<String, Value>) -> ArgumentResult<Self> {
        let mut opts = ArgOptions::new();
        for (key, value) in map {
            if key == "args" {
                let names = value.as_array().ok_or_else(|| ArgumentError::InvalidOption {
                    key: "args".to_string(),
                    reason: "expected a list of names".to_string(),
                })?;
                opts.args = names.iter().map(value_to_plain_string).collect();
            } else {
                opts.options.set(key, value.clone())?;
            }
        }
        Ok(opts)
    }

    /// Append a name or flag.
    pub fn arg(mut self, name: impl Into<String>) -> Self {
        self.args.push(name.into());
        self
    }

    /// Set an option by keyword. Fails on `dest` and unknown keys.
    pub fn option(mut self, key: &str, value: impl Into<Value>) -> ArgumentResult<Self> {
        self.options.set(key, value.into())?;
        Ok(self)
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.options.default = Some(value.into());
        self
    }

    /// Set the explicit required flag.
    pub fn required(mut self, required: bool) -> Self {
        self.options.required = Some(required);
        self
    }

    /// Set the value kind.
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.options.kind = Some(kind);
        self
    }

    /// Set the metavar.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.options.metavar = Some(metavar.into());
        self
    }

    /// Restrict the accepted values.
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Set the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.options.help = Some(help.into());
        self
    }

    /// Set the parser action.
    pub fn action(mut self, action: ArgAction) -> Self {
        self.options.action = Some(action);
        self
    }

    /// True when the sentinel carries nothing.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.options.is_empty()
    }
}

/// Current value of a declaration field.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentPolicy {
    /// Concrete value, no longer settable from the command line.
    Fixed(Value),
    /// Must be supplied by the caller.
    Required(ArgOptions),
    /// Exposed as an optional flag defaulting to the field default.
    Optional(ArgOptions),
    /// Never exposed; resolved to the field default.
    Hidden,
    /// Unfilled placeholder. Exposed like `Required` unless a
    /// [`StdinConverter`](crate::process::StdinConverter) fills it later.
    Hole,
}

/// The field must be given on the command line.
pub const REQUIRED_ARGUMENT: ArgumentPolicy = ArgumentPolicy::Required(ArgOptions::new());
/// The field is an optional flag.
pub const OPTIONAL_ARGUMENT: ArgumentPolicy = ArgumentPolicy::Optional(ArgOptions::new());
/// The field is never exposed.
pub const HIDDEN_ARGUMENT: ArgumentPolicy = ArgumentPolicy::Hidden;
/// The field is filled later.
pub const HOLE: ArgumentPolicy = ArgumentPolicy::Hole;

impl ArgumentPolicy {
    /// Concrete value.
    pub fn fixed(value: impl Into<Value>) -> Self {
        ArgumentPolicy::Fixed(value.into())
    }

    /// Check for the `Required` sentinel.
    pub fn is_required(&self) -> bool {
        matches!(self, ArgumentPolicy::Required(_))
    }

    /// Check for the `Optional` sentinel.
    pub fn is_optional(&self) -> bool {
        matches!(self, ArgumentPolicy::Optional(_))
    }

    /// Check for the `Hidden` sentinel.
    pub fn is_hidden(&self) -> bool {
        matches!(self, ArgumentPolicy::Hidden)
    }

    /// Check for the hole placeholder.
    pub fn is_hole(&self) -> bool {
        matches!(self, ArgumentPolicy::Hole)
    }

    /// Check for any sentinel.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, ArgumentPolicy::Fixed(_))
    }

    /// The concrete value, if any.
    pub fn as_fixed(&self) -> Option<&Value> {
        match self {
            ArgumentPolicy::Fixed(value) => Some(value),
            _ => None,
        }
    }

    /// Parser options carried by a parameterised sentinel.
    pub fn overrides(&self) -> Option<&ArgOptions> {
        match self {
            ArgumentPolicy::Required(opts) | ArgumentPolicy::Optional(opts) => Some(opts),
            _ => None,
        }
    }
}

impl From<Value> for ArgumentPolicy {
    fn from(value: Value) -> Self {
        ArgumentPolicy::Fixed(value)
    }
}

impl From<&str> for ArgumentPolicy {
    fn from(value: &str) -> Self {
        ArgumentPolicy::Fixed(Value::String(value.to_string()))
    }
}

impl From<String> for ArgumentPolicy {
    fn from(value: String) -> Self {
        ArgumentPolicy::Fixed(Value::String(value))
    }
}

impl From<bool> for ArgumentPolicy {
    fn from(value: bool) -> Self {
        ArgumentPolicy::Fixed(Value::Bool(value))
    }
}

impl From<i64> for ArgumentPolicy {
    fn from(value: i64) -> Self {
        ArgumentPolicy::Fixed(Value::from(value))
    }
}

/// Render a value the way it is typed on a command line.
pub fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
