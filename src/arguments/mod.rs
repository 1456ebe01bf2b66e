//! Argument exposition
//!
//! Declarations describe runnable units as named fields. Each field holds an
//! [`ArgumentPolicy`]: a concrete value, or a sentinel asking for the value
//! to come from the command line (`Required`, `Optional`), to stay out of
//! it (`Hidden`), or to be filled later (`Hole`).
//!
//! This module computes the CLI arguments of a declaration and merges parsed
//! values back into a new declaration.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use yeti::arguments::{Declaration, FieldDescriptor, IncludeFields, Schema, OPTIONAL_ARGUMENT};
//!
//! let schema = Arc::new(Schema::new("A").field(FieldDescriptor::new("default_argument").with_default("ABC")));
//! let decl = Declaration::new(schema, [("default_argument", OPTIONAL_ARGUMENT)]).unwrap();
//! let specs = decl.arguments(IncludeFields::All).unwrap();
//! assert_eq!(specs["default_argument"].args, vec!["--default-argument"]);
//! ```

mod declaration;
mod error;
mod field;
mod policy;
mod spec;

pub use declaration::Declaration;
pub use error::{ArgumentError, ArgumentResult};
pub use field::{FieldDefault, FieldDescriptor, Schema};
pub use policy::{
    value_to_plain_string, ArgAction, ArgOptions, ArgumentPolicy, ParserOptions, ValueKind,
    HIDDEN_ARGUMENT, HOLE, OPTIONAL_ARGUMENT, REQUIRED_ARGUMENT,
};
pub use spec::{
    argslug, extract_values, flag_name, ArgumentSpec, ExposeArguments, IncludeFields,
    ProvidedValues,
};
