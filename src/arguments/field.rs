//! Field descriptors and declaration schemas

use super::policy::{ArgOptions, ValueKind};
use super::spec::ArgumentSpec;
use serde_json::Value;

/// Static default of a field.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// The field has no default.
    None,
    /// A static value.
    Value(Value),
    /// A factory producing a fresh value on every call.
    Factory(fn() -> Value),
}

impl FieldDefault {
    /// Produce the default value, calling the factory if needed.
    pub fn resolve(&self) -> Option<Value> {
        match self {
            FieldDefault::None => None,
            FieldDefault::Value(value) => Some(value.clone()),
            FieldDefault::Factory(factory) => Some(factory()),
        }
    }

    /// Whether a default exists.
    pub fn is_some(&self) -> bool {
        !matches!(self, FieldDefault::None)
    }
}

impl PartialEq for FieldDefault {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldDefault::None, FieldDefault::None) => true,
            (FieldDefault::Value(a), FieldDefault::Value(b)) => a == b,
            (FieldDefault::Factory(a), FieldDefault::Factory(b)) => a() == b(),
            _ => false,
        }
    }
}

/// One declared field of a declaration type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, also the parsed value destination.
    pub name: String,
    /// Static default.
    pub default: FieldDefault,
    /// Whether the field can be set when creating a declaration.
    pub init: bool,
    /// How raw CLI strings are converted for this field.
    pub kind: ValueKind,
    /// CLI names and parser options attached to the field.
    pub metadata: Option<ArgumentSpec>,
}

impl FieldDescriptor {
    /// A settable string field without default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: FieldDefault::None,
            init: true,
            kind: ValueKind::String,
            metadata: None,
        }
    }

    /// A field holding a constant that is never exposed on the command line.
    pub fn final_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut field = Self::new(name).with_default(value);
        field.metadata = Some(ArgumentSpec {
            exclude: true,
            ..ArgumentSpec::default()
        });
        field
    }

    /// Set a static default.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Set a default factory.
    pub fn with_factory(mut self, factory: fn() -> Value) -> Self {
        self.default = FieldDefault::Factory(factory);
        self
    }

    /// Set the value kind.
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Make the field impossible to set at construction time.
    pub fn not_init(mut self) -> Self {
        self.init = false;
        self
    }

    /// Attach CLI names and parser options.
    ///
    /// A `default` among the options becomes the field default as well.
    pub fn args(mut self, opts: ArgOptions) -> Self {
        if let Some(default) = &opts.options.default {
            self.default = FieldDefault::Value(default.clone());
        }
        let exclude = self.metadata.as_ref().map(|m| m.exclude).unwrap_or(false);
        self.metadata = Some(ArgumentSpec {
            args: opts.args,
            options: opts.options,
            exclude,
        });
        self
    }

    /// Mark the field as never added to a parser.
    pub fn excluded(mut self) -> Self {
        let mut spec = self.metadata.take().unwrap_or_default();
        spec.exclude = true;
        self.metadata = Some(spec);
        self
    }

    /// Static default or factory result.
    pub fn default_value(&self) -> Option<Value> {
        self.default.resolve()
    }
}

/// Explicit description of the fields of a declaration type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Type name, shown in process listings.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// A schema without fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    ///
    /// A field with the same name as an earlier one replaces it, keeping its
    /// position.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Look a field up by name.
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}
