//! Process composition
//!
//! A [`Process`] is a runnable unit producing a lazy sequence of output
//! lines. Shell commands are declarations rendered through a template;
//! they compose with `|` into sequential or piped runs, and a
//! [`StdinConverter`] feeds the complete output of the previous step into
//! the fields of its target.
//!
//! # Example
//!
//! ```rust,no_run
//! use yeti::process::{Process, RunContext};
//!
//! let pipeline = Process::command("printf 'b\\na\\n'") | Process::command("sort");
//! for line in pipeline.run(&RunContext::default()).unwrap() {
//!     println!("{}", line.unwrap());
//! }
//! ```

mod command;
mod converter;
mod error;
mod executor;
mod print;
mod sequential;
mod template;

pub use command::{command_schema, CommandProcess, COMMAND_SCHEMA};
pub use converter::{ConvertFn, Converter, Replacement, Replacements, StdinConverter};
pub use error::{ProcessError, ProcessResult};
pub use executor::{Input, RunContext, StderrMode, StdinMode};
pub use print::PrintProcess;
pub use sequential::SequentialProcess;
pub use template::{render_value, shell_quote, Template};

use crate::arguments::{
    ArgumentResult, ArgumentSpec, Declaration, ExposeArguments, IncludeFields, ProvidedValues,
};
use executor::{spawn_shell, OutputLines};
use indexmap::IndexMap;
use std::ops::BitOr;

/// Lazy output of a run.
///
/// Yields the output lines, then an [`ProcessError::Exit`] if the process
/// failed.
pub struct Output {
    inner: Box<dyn Iterator<Item = ProcessResult<String>>>,
}

impl Output {
    /// Wrap an iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = ProcessResult<String>> + 'static,
    {
        Self {
            inner: Box::new(iter),
        }
    }

    /// Output made of already collected lines.
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self::new(lines.into_iter().map(Ok))
    }

    /// Collect every line, failing on the first error.
    pub fn collect_lines(self) -> ProcessResult<Vec<String>> {
        self.collect()
    }
}

impl Iterator for Output {
    type Item = ProcessResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

/// A runnable unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Process {
    /// Shell command rendered from a declaration.
    Command(CommandProcess),
    /// Ordered composition.
    Sequential(SequentialProcess),
    /// Target filled from the previous output.
    Converter(StdinConverter),
    /// Constant output.
    Print(PrintProcess),
}

impl Process {
    /// The base shell command running `cmd` verbatim.
    pub fn command(cmd: impl Into<crate::arguments::ArgumentPolicy>) -> Self {
        Process::Command(CommandProcess {
            declaration: Declaration::single(command_schema(), "cmd", cmd.into()),
            template: Template::placeholder("cmd", true),
            nested: IndexMap::new(),
        })
    }

    /// Sequential composition.
    pub fn sequential(processes: Vec<Process>, piped: bool) -> Self {
        Process::Sequential(SequentialProcess::new(processes, piped))
    }

    /// Run `target` with the replacements computed from the previous output.
    pub fn converter(target: Process, converter: Converter) -> Self {
        Process::Converter(StdinConverter::new(target, converter))
    }

    /// Print a constant value.
    pub fn print(value: impl Into<serde_json::Value>) -> Self {
        Process::Print(PrintProcess::new(value))
    }

    /// Whether this is, or ends in, a stdin converter.
    pub fn ends_in_converter(&self) -> bool {
        match self {
            Process::Converter(_) => true,
            Process::Sequential(seq) => seq.ends_in_converter(),
            _ => false,
        }
    }

    fn piped_steps(&self) -> Option<&[Process]> {
        match self {
            Process::Sequential(seq) if seq.piped => Some(&seq.processes),
            _ => None,
        }
    }

    /// Run with stdin taken from the context.
    pub fn run(&self, ctx: &RunContext) -> ProcessResult<Output> {
        self.run_with_input(ctx.input(), ctx)
    }

    /// Run with an explicit stdin.
    pub fn run_with_input(&self, input: Input, ctx: &RunContext) -> ProcessResult<Output> {
        match self {
            Process::Command(cmd) => {
                let line = cmd.command_line()?;
                let child = spawn_shell(&line, input, ctx)?;
                Ok(Output::new(OutputLines::new(child, line)))
            }
            Process::Sequential(seq) => seq.run_with_input(input, ctx),
            Process::Converter(conv) => {
                let text = input.read_all()?;
                conv.prepare(&text)?.run_with_input(Input::Null, ctx)
            }
            Process::Print(print) => Ok(Output::from_lines(print.lines())),
        }
    }

    /// Shell command line equivalent to the process.
    pub fn command_line(&self) -> ProcessResult<String> {
        match self {
            Process::Command(cmd) => cmd.command_line(),
            Process::Sequential(seq) => seq.command_line(),
            Process::Converter(conv) => conv.target.command_line(),
            Process::Print(_) => Err(ProcessError::NotShellCommand(self.to_string())),
        }
    }

    /// Whether a replacement or parsed value can target `name`.
    pub fn has_field(&self, name: &str) -> bool {
        match self {
            Process::Command(cmd) => cmd.has_field(name),
            Process::Sequential(seq) => seq.processes.iter().any(|p| p.has_field(name)),
            Process::Converter(conv) => conv.target.has_field(name),
            Process::Print(_) => name == "value",
        }
    }

    /// Apply replacements, recursing into nested processes and list fields.
    pub fn smart_replace(&self, replacements: &Replacements) -> ProcessResult<Process> {
        Ok(match self {
            Process::Command(cmd) => Process::Command(cmd.smart_replace(replacements)?),
            Process::Sequential(seq) => Process::Sequential(seq.smart_replace(replacements)?),
            Process::Converter(conv) => Process::Converter(StdinConverter {
                target: Box::new(conv.target.smart_replace(replacements)?),
                converter: conv.converter.clone(),
            }),
            Process::Print(print) => Process::Print(print.smart_replace(replacements)?),
        })
    }

    /// Apply only the replacements this process has a field for, to every
    /// step of a sequence.
    pub(crate) fn replace_each(&self, replacements: &Replacements) -> ProcessResult<Process> {
        match self {
            Process::Sequential(seq) => Ok(Process::Sequential(SequentialProcess {
                processes: seq
                    .processes
                    .iter()
                    .map(|p| p.replace_each(replacements))
                    .collect::<ProcessResult<_>>()?,
                piped: seq.piped,
            })),
            other => {
                let relevant: Replacements = replacements
                    .iter()
                    .filter(|(name, _)| other.has_field(name))
                    .map(|(name, r)| (name.clone(), r.clone()))
                    .collect();
                other.smart_replace(&relevant)
            }
        }
    }
}

impl ExposeArguments for Process {
    fn argument_specs(&self, include: IncludeFields<'_>) -> ArgumentResult<Vec<(String, ArgumentSpec)>> {
        match self {
            Process::Command(cmd) => {
                let mut specs = cmd.declaration.argument_specs(include)?;
                for nested in cmd.nested.values() {
                    specs.extend(nested.argument_specs(include)?);
                }
                Ok(specs)
            }
            Process::Sequential(seq) => {
                let mut specs = Vec::new();
                for process in &seq.processes {
                    specs.extend(process.argument_specs(include)?);
                }
                Ok(specs)
            }
            Process::Converter(conv) => {
                // Holes of the target are filled by the converter
                let not_hole = |decl: &Declaration, field: &crate::arguments::FieldDescriptor| {
                    !decl.get(&field.name).map(|p| p.is_hole()).unwrap_or(false)
                        && include.includes(decl, field)
                };
                conv.target.argument_specs(IncludeFields::Matching(&not_hole))
            }
            Process::Print(_) => Ok(Vec::new()),
        }
    }

    fn with_arguments(&self, values: &ProvidedValues) -> ArgumentResult<Self> {
        Ok(match self {
            Process::Command(cmd) => Process::Command(cmd.with_arguments(values)?),
            Process::Sequential(seq) => Process::Sequential(SequentialProcess {
                processes: seq
                    .processes
                    .iter()
                    .map(|p| p.with_arguments(values))
                    .collect::<ArgumentResult<_>>()?,
                piped: seq.piped,
            }),
            Process::Converter(conv) => Process::Converter(StdinConverter {
                target: Box::new(conv.target.with_arguments(values)?),
                converter: conv.converter.clone(),
            }),
            Process::Print(print) => Process::Print(print.clone()),
        })
    }
}

impl BitOr for Process {
    type Output = Process;

    /// Compose two processes.
    ///
    /// A converter on the right, or a left side ending in one, gives a
    /// non-piped sequence. Otherwise the result is piped, extending a piped
    /// sequence found on either side.
    fn bitor(self, other: Process) -> Process {
        if self.ends_in_converter() {
            return match self {
                Process::Sequential(mut seq) if !seq.piped => {
                    seq.processes.push(other);
                    Process::Sequential(seq)
                }
                left => Process::sequential(vec![left, other], false),
            };
        }

        if matches!(other, Process::Converter(_)) {
            return Process::sequential(vec![self, other], false);
        }

        let mut steps = match self.piped_steps() {
            Some(steps) => steps.to_vec(),
            None => vec![self],
        };
        match other.piped_steps() {
            Some(right) => steps.extend(right.iter().cloned()),
            None => steps.push(other),
        }
        Process::sequential(steps, true)
    }
}

impl std::fmt::Display for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Process::Command(cmd) => write!(f, "{}", cmd),
            Process::Sequential(seq) => {
                let joiner = if seq.piped { " | " } else { ", " };
                let steps: Vec<String> = seq.processes.iter().map(|p| p.to_string()).collect();
                write!(f, "Sequential[{}]", steps.join(joiner))
            }
            Process::Converter(conv) => write!(f, "StdinConverter[{}]", conv.target),
            Process::Print(_) => write!(f, "Print"),
        }
    }
}

impl From<CommandProcess> for Process {
    fn from(cmd: CommandProcess) -> Self {
        Process::Command(cmd)
    }
}

impl From<SequentialProcess> for Process {
    fn from(seq: SequentialProcess) -> Self {
        Process::Sequential(seq)
    }
}

impl From<StdinConverter> for Process {
    fn from(conv: StdinConverter) -> Self {
        Process::Converter(conv)
    }
}
