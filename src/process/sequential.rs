//! Sequential and piped composition

use super::converter::Replacements;
use super::error::{ProcessError, ProcessResult};
use super::executor::{spawn_shell, Input, RunContext, Upstream};
use super::{Output, Process};
use tracing::{info, warn};

/// Processes run one after the other, or chained through pipes.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialProcess {
    /// Steps, in order.
    pub processes: Vec<Process>,
    /// Whether each step's stdout feeds the next step's stdin.
    pub piped: bool,
}

impl SequentialProcess {
    /// Compose processes.
    pub fn new(processes: Vec<Process>, piped: bool) -> Self {
        Self { processes, piped }
    }

    /// Whether the last step is, or ends in, a stdin converter.
    pub fn ends_in_converter(&self) -> bool {
        self.processes
            .last()
            .map(Process::ends_in_converter)
            .unwrap_or(false)
    }

    pub(crate) fn run_with_input(&self, input: Input, ctx: &RunContext) -> ProcessResult<Output> {
        if self.piped {
            self.run_piped(input, ctx)
        } else {
            self.run_steps(input, ctx)
        }
    }

    /// Run every step to completion, collecting all lines. The first failure
    /// aborts the run.
    fn run_steps(&self, input: Input, ctx: &RunContext) -> ProcessResult<Output> {
        let mut input = Some(input);
        let mut outputs = Vec::new();
        let mut previous: Option<Vec<String>> = None;

        for step in &self.processes {
            let step_input = input.take().unwrap_or_else(|| ctx.input());
            let result = match (step, &previous) {
                (Process::Converter(converter), Some(lines)) => converter
                    .prepare(&lines.join("\n"))
                    .and_then(|target| target.run_with_input(step_input, ctx)),
                _ => step.run_with_input(step_input, ctx),
            }
            .and_then(Output::collect_lines);

            match result {
                Ok(lines) => {
                    outputs.extend(lines.iter().cloned());
                    previous = Some(lines);
                }
                Err(e) => {
                    info!("Process {} failed with error {}", step, e);
                    return Err(e);
                }
            }
        }

        Ok(Output::from_lines(outputs))
    }

    /// Chain the steps through pipes and stream the last one.
    ///
    /// Steps that are not shell commands run to completion and their output
    /// is written to the next step. Only the last step's exit status is
    /// reported; upstream failures are logged once the output is consumed.
    fn run_piped(&self, input: Input, ctx: &RunContext) -> ProcessResult<Output> {
        let Some((last, stages)) = self.processes.split_last() else {
            return Ok(Output::from_lines(Vec::new()));
        };

        let mut upstream = Upstream::new();
        let mut input = input;
        for stage in stages {
            input = match stage {
                Process::Command(cmd) => {
                    let line = cmd.command_line()?;
                    let mut child = spawn_shell(&line, input, ctx)?;
                    let stdout = child.stdout.take();
                    upstream.push(child, line);
                    stdout.map(Input::Pipe).unwrap_or(Input::Null)
                }
                other => {
                    let mut text = String::new();
                    for line in other.run_with_input(input, ctx)? {
                        match line {
                            Ok(line) => {
                                text.push_str(&line);
                                text.push('\n');
                            }
                            Err(e) => {
                                warn!("Upstream process {} failed (masked by the pipe): {}", other, e);
                                break;
                            }
                        }
                    }
                    Input::Text(text)
                }
            };
        }

        let mut last_output = last.run_with_input(input, ctx)?;
        Ok(Output::new(std::iter::from_fn(move || {
            let next = last_output.next();
            if next.is_none() {
                upstream.reap();
            }
            next
        })))
    }

    /// Shell equivalent of the composition.
    pub fn command_line(&self) -> ProcessResult<String> {
        let joiner = if self.piped { " | " } else { " && " };
        Ok(self
            .processes
            .iter()
            .map(Process::command_line)
            .collect::<ProcessResult<Vec<_>>>()?
            .join(joiner))
    }

    pub(crate) fn smart_replace(&self, replacements: &Replacements) -> ProcessResult<Self> {
        if let Some(name) = replacements
            .keys()
            .find(|name| !self.processes.iter().any(|p| p.has_field(name)))
        {
            return Err(ProcessError::Replacement {
                process: Process::Sequential(self.clone()).to_string(),
                field: name.clone(),
            });
        }
        Ok(Self {
            processes: self
                .processes
                .iter()
                .map(|p| p.replace_each(replacements))
                .collect::<ProcessResult<_>>()?,
            piped: self.piped,
        })
    }
}
