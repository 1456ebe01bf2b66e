//! Shell command templates
//!
//! A template is a shell command line with `{field}` placeholders. Values
//! are single-quoted for the shell unless the placeholder is written
//! `{field:raw}`. `{{` and `}}` stand for literal braces.

use super::error::{ProcessError, ProcessResult};
use crate::arguments::{value_to_plain_string, Declaration, ValueKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { name: String, raw: bool },
}

/// A parsed command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template.
    pub fn parse(source: &str) -> ProcessResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => placeholder.push(c),
                            None => return Err(ProcessError::template(source, "unclosed '{'")),
                        }
                    }
                    let (name, raw) = match placeholder.split_once(':') {
                        Some((name, "raw")) => (name, true),
                        Some((_, modifier)) => {
                            return Err(ProcessError::template(
                                source,
                                format!("unknown modifier '{}'", modifier),
                            ))
                        }
                        None => (placeholder.as_str(), false),
                    };
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(ProcessError::template(source, "empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        name: name.to_string(),
                        raw,
                    });
                }
                '}' => return Err(ProcessError::template(source, "single '}' encountered")),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Template made of a single placeholder.
    pub(crate) fn placeholder(name: &str, raw: bool) -> Self {
        let modifier = if raw { ":raw" } else { "" };
        Self {
            source: format!("{{{}{}}}", name, modifier),
            segments: vec![Segment::Field {
                name: name.to_string(),
                raw,
            }],
        }
    }

    /// Template as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of every placeholder, in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template with the values of a declaration.
    ///
    /// `lookup` is asked first for placeholders that are not declaration
    /// fields; it returns the already-rendered text for them.
    pub fn render<F>(&self, declaration: &Declaration, mut lookup: F) -> ProcessResult<String>
    where
        F: FnMut(&str) -> Option<ProcessResult<String>>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { name, raw } => {
                    if let Some(field) = declaration.schema().get(name) {
                        let value = declaration.resolved_value(name)?;
                        out.push_str(&render_value(&value, field.kind, *raw));
                    } else if let Some(rendered) = lookup(name) {
                        let rendered = rendered?;
                        if *raw {
                            out.push_str(&rendered);
                        } else {
                            out.push_str(&shell_quote(&rendered));
                        }
                    } else {
                        return Err(ProcessError::template(
                            &self.source,
                            format!("unknown field '{}'", name),
                        ));
                    }
                }
            }
        }
        Ok(out)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Render one value for a command line.
///
/// Lists become one shell word per element. `null` renders as nothing.
pub fn render_value(value: &Value, kind: ValueKind, raw: bool) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, kind, raw))
            .collect::<Vec<_>>()
            .join(" "),
        other => {
            let mut text = value_to_plain_string(other);
            if kind == ValueKind::Path {
                text = shellexpand::tilde(&text).into_owned();
            }
            if raw {
                text
            } else {
                shell_quote(&text)
            }
        }
    }
}

/// Quote a string so the shell reads it back as a single word.
pub fn shell_quote(s: &str) -> String {
    shell_words::quote(s).into_owned()
}
