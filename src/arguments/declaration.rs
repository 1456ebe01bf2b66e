//! Immutable declarations and the exposition/reconciliation rules

use super::error::{ArgumentError, ArgumentResult};
use super::field::{FieldDescriptor, Schema};
use super::policy::{ArgumentPolicy, ValueKind};
use super::spec::{argslug, flag_name, ArgumentSpec, IncludeFields, ProvidedValues};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// An instance of a declaration type: one policy per field.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    schema: Arc<Schema>,
    values: IndexMap<String, ArgumentPolicy>,
}

impl Declaration {
    /// Create a declaration from explicit field values.
    ///
    /// Fields left out take their default. Fails on unknown fields, on
    /// values for fields that are not settable and on missing fields
    /// without default.
    pub fn new<I, K>(schema: Arc<Schema>, values: I) -> ArgumentResult<Self>
    where
        I: IntoIterator<Item = (K, ArgumentPolicy)>,
        K: Into<String>,
    {
        let mut provided: IndexMap<String, ArgumentPolicy> = IndexMap::new();
        for (name, policy) in values {
            let name = name.into();
            match schema.get(&name) {
                None => {
                    return Err(ArgumentError::UnknownField {
                        schema: schema.name.clone(),
                        field: name,
                    })
                }
                Some(field) if !field.init => return Err(ArgumentError::NotSettable(name)),
                Some(_) => {
                    provided.insert(name, policy);
                }
            }
        }

        let mut resolved = IndexMap::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let policy = match provided.shift_remove(&field.name) {
                Some(policy) => policy,
                None => match field.default_value() {
                    Some(default) => ArgumentPolicy::Fixed(default),
                    None => {
                        return Err(ArgumentError::MissingField {
                            schema: schema.name.clone(),
                            field: field.name.clone(),
                        })
                    }
                },
            };
            resolved.insert(field.name.clone(), policy);
        }

        Ok(Self {
            schema,
            values: resolved,
        })
    }

    /// Declaration with a single settable field and no validation.
    pub(crate) fn single(schema: Arc<Schema>, name: &str, policy: ArgumentPolicy) -> Self {
        let mut values = IndexMap::new();
        values.insert(name.to_string(), policy);
        Self { schema, values }
    }

    /// Type name of the declaration.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Field descriptions.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Current policy of a field.
    pub fn get(&self, name: &str) -> Option<&ArgumentPolicy> {
        self.values.get(name)
    }

    /// Whether the declaration has a field with this name.
    pub fn has_field(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Fields with their current policy, in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&FieldDescriptor, &ArgumentPolicy)> {
        self.schema
            .fields
            .iter()
            .filter_map(move |f| self.values.get(&f.name).map(|v| (f, v)))
    }

    /// Compute the command-line arguments of the declaration, keyed by field.
    pub fn arguments(
        &self,
        include: IncludeFields<'_>,
    ) -> ArgumentResult<IndexMap<String, ArgumentSpec>> {
        let mut specs = IndexMap::new();

        for field in self.schema.fields.iter().filter(|f| f.init) {
            let Some(value) = self.values.get(&field.name) else {
                continue;
            };

            // Only sentinels asking for user input are exposed. A hole
            // stands for a required value that is not filled yet.
            let overrides = match value {
                ArgumentPolicy::Required(opts) | ArgumentPolicy::Optional(opts) => Some(opts),
                ArgumentPolicy::Hole => None,
                ArgumentPolicy::Fixed(_) | ArgumentPolicy::Hidden => continue,
            };

            if !include.includes(self, field) {
                continue;
            }

            let mut spec = field.metadata.clone().unwrap_or_default();

            let optional = value.is_optional();
            let mut arg_name = spec
                .args
                .first()
                .cloned()
                .unwrap_or_else(|| field.name.clone());
            if optional {
                arg_name = flag_name(&arg_name);
                spec.options.default = field.default_value();
            } else {
                spec.options.default = None;
            }
            spec.args = vec![arg_name];

            if let Some(opts) = overrides {
                if !opts.args.is_empty() {
                    spec.args = opts.args.clone();
                }
                spec.options.merge(&opts.options);
            }

            if spec.options.kind.is_none() && field.kind != ValueKind::String {
                spec.options.kind = Some(field.kind);
            }

            // The parsed value must always land on the field name.
            let shown = spec.args[0].clone();
            if argslug(shown.trim_start_matches('-')) != argslug(&field.name) {
                if shown.starts_with('-') {
                    spec.options.dest = Some(field.name.clone());
                } else {
                    spec.options.metavar = Some(shown);
                    spec.args[0] = field.name.clone();
                }
            }

            specs.insert(field.name.clone(), spec);
        }

        Ok(specs)
    }

    /// Build a new declaration from parsed values.
    ///
    /// Hidden fields resolve to their default. Provided values are adopted
    /// for known settable fields unless they are themselves `Required` or a
    /// hole. Unknown keys are ignored.
    pub fn with_arguments(&self, provided: &ProvidedValues) -> ArgumentResult<Self> {
        let mut values = self.values.clone();

        for (name, value) in provided {
            let settable = self.schema.get(name).map(|f| f.init).unwrap_or(false);
            if settable && !value.is_required() && !value.is_hole() {
                values.insert(name.clone(), value.clone());
            }
        }

        for field in &self.schema.fields {
            if matches!(self.values.get(&field.name), Some(ArgumentPolicy::Hidden)) {
                let default = field
                    .default_value()
                    .ok_or_else(|| ArgumentError::HiddenWithoutDefault(field.name.clone()))?;
                values.insert(field.name.clone(), ArgumentPolicy::Fixed(default));
            }
        }

        Ok(Self {
            schema: Arc::clone(&self.schema),
            values,
        })
    }

    /// Concrete value of a field as used at run time.
    pub fn resolved_value(&self, name: &str) -> ArgumentResult<Value> {
        let field = self.schema.get(name).ok_or_else(|| ArgumentError::UnknownField {
            schema: self.schema.name.clone(),
            field: name.to_string(),
        })?;

        match self.values.get(name) {
            Some(ArgumentPolicy::Fixed(value)) => Ok(value.clone()),
            Some(ArgumentPolicy::Optional(_)) => Ok(field.default_value().unwrap_or(Value::Null)),
            Some(ArgumentPolicy::Hidden) => field
                .default_value()
                .ok_or_else(|| ArgumentError::HiddenWithoutDefault(name.to_string())),
            Some(ArgumentPolicy::Required(_)) | Some(ArgumentPolicy::Hole) | None => {
                Err(ArgumentError::Unresolved(name.to_string()))
            }
        }
    }

    /// Return a copy with one field replaced.
    pub fn replace(&self, name: &str, policy: ArgumentPolicy) -> ArgumentResult<Self> {
        match self.schema.get(name) {
            None => Err(ArgumentError::UnknownField {
                schema: self.schema.name.clone(),
                field: name.to_string(),
            }),
            Some(field) if !field.init => Err(ArgumentError::NotSettable(name.to_string())),
            Some(_) => {
                let mut values = self.values.clone();
                values.insert(name.to_string(), policy);
                Ok(Self {
                    schema: Arc::clone(&self.schema),
                    values,
                })
            }
        }
    }
}

impl std::fmt::Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.schema.name)
    }
}
