//! Shell execution for command processes.

use super::error::{ProcessError, ProcessResult};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use tracing::{debug, warn};

/// Where standard input of a process comes from.
#[derive(Debug)]
pub enum Input {
    /// Inherit the caller's stdin.
    Inherit,
    /// Empty stdin.
    Null,
    /// Stdout of an upstream child.
    Pipe(ChildStdout),
    /// Text written to the child by a helper thread.
    Text(String),
}

impl Input {
    /// Consume the input as text.
    pub fn read_all(self) -> ProcessResult<String> {
        let mut text = String::new();
        match self {
            Input::Null => {}
            Input::Text(t) => text = t,
            Input::Pipe(mut stdout) => {
                stdout.read_to_string(&mut text)?;
            }
            Input::Inherit => {
                std::io::stdin().read_to_string(&mut text)?;
            }
        }
        Ok(text)
    }
}

/// How stdin is wired for the first process of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdinMode {
    /// Inherit the caller's stdin.
    #[default]
    Inherit,
    /// Empty stdin.
    Null,
}

/// Where children's stderr goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StderrMode {
    /// Inherit the caller's stderr.
    #[default]
    Inherit,
    /// Discard.
    Null,
    /// Append to a file.
    File(PathBuf),
}

/// Settings shared by every process of a run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Stdin of the first process.
    pub stdin: StdinMode,
    /// Stderr of every process.
    pub stderr: StderrMode,
}

impl RunContext {
    /// Discard stdin and stderr.
    pub fn quiet() -> Self {
        Self {
            stdin: StdinMode::Null,
            stderr: StderrMode::Null,
        }
    }

    /// Fresh input following the stdin mode.
    pub fn input(&self) -> Input {
        match self.stdin {
            StdinMode::Inherit => Input::Inherit,
            StdinMode::Null => Input::Null,
        }
    }

    fn stderr_stdio(&self) -> ProcessResult<Stdio> {
        Ok(match &self.stderr {
            StderrMode::Inherit => Stdio::inherit(),
            StderrMode::Null => Stdio::null(),
            StderrMode::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Stdio::from(file)
            }
        })
    }
}

/// Start `sh -c <command>` with stdout piped.
pub fn spawn_shell(command: &str, input: Input, ctx: &RunContext) -> ProcessResult<Child> {
    debug!("Running: {}", command);

    let (stdin, text) = match input {
        Input::Inherit => (Stdio::inherit(), None),
        Input::Null => (Stdio::null(), None),
        Input::Pipe(stdout) => (Stdio::from(stdout), None),
        Input::Text(text) => (Stdio::piped(), Some(text)),
    };

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(ctx.stderr_stdio()?)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            command: command.to_string(),
            source,
        })?;

    if let (Some(text), Some(mut stdin)) = (text, child.stdin.take()) {
        std::thread::spawn(move || {
            // The child may exit without reading everything
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                debug!("Stopped writing to child stdin: {}", e);
            }
        });
    }

    Ok(child)
}

/// Lines of a child's stdout, followed by an exit error on failure.
pub struct OutputLines {
    child: Option<Child>,
    reader: Option<BufReader<ChildStdout>>,
    command: String,
}

impl OutputLines {
    /// Stream the output of a spawned child.
    pub fn new(mut child: Child, command: impl Into<String>) -> Self {
        let reader = child.stdout.take().map(BufReader::new);
        Self {
            child: Some(child),
            reader,
            command: command.into(),
        }
    }

    fn finish(&mut self) -> Option<ProcessResult<String>> {
        self.reader = None;
        let mut child = self.child.take()?;
        match child.wait() {
            Ok(status) if status.success() => None,
            Ok(status) => Some(Err(ProcessError::Exit {
                status: status.code().unwrap_or(-1),
                command: self.command.clone(),
            })),
            Err(e) => Some(Err(e.into())),
        }
    }
}

impl Iterator for OutputLines {
    type Item = ProcessResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(reader) = self.reader.as_mut() else {
            return self.finish();
        };

        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => self.finish(),
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&buf).into_owned()))
            }
            Err(e) => {
                self.reader = None;
                Some(Err(e.into()))
            }
        }
    }
}

impl Drop for OutputLines {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

/// Children feeding a pipeline, reaped once the last stage is done.
pub struct Upstream {
    children: Vec<(Child, String)>,
}

impl Upstream {
    /// No upstream children.
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    /// Track a child.
    pub fn push(&mut self, child: Child, command: impl Into<String>) {
        self.children.push((child, command.into()));
    }

    /// Wait for every child and log failures, which a pipe masks.
    pub fn reap(&mut self) {
        for (mut child, command) in self.children.drain(..) {
            match child.wait() {
                Ok(status) if !status.success() => warn!(
                    "Upstream command '{}' exited with status {} (masked by the pipe)",
                    command,
                    status.code().unwrap_or(-1)
                ),
                Ok(_) => {}
                Err(e) => warn!("Failed to wait for '{}': {}", command, e),
            }
        }
    }
}

impl Default for Upstream {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Upstream {
    fn drop(&mut self) {
        for (child, _) in self.children.iter_mut() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_command() {
        let child = spawn_shell("echo 'Hello World'", Input::Null, &RunContext::quiet()).unwrap();
        let lines: Vec<_> = OutputLines::new(child, "echo").collect::<ProcessResult<_>>().unwrap();
        assert_eq!(lines, vec!["Hello World"]);
    }

    #[test]
    fn test_exit_status_after_output() {
        let child = spawn_shell("echo partial; exit 3", Input::Null, &RunContext::quiet()).unwrap();
        let mut lines = OutputLines::new(child, "failing");
        assert_eq!(lines.next().unwrap().unwrap(), "partial");
        let err = lines.next().unwrap().unwrap_err();
        assert_eq!(err.exit_status(), Some(3));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_text_input() {
        let child = spawn_shell(
            "tr a-z A-Z",
            Input::Text("hello\nworld\n".to_string()),
            &RunContext::quiet(),
        )
        .unwrap();
        let lines: Vec<_> = OutputLines::new(child, "tr").collect::<ProcessResult<_>>().unwrap();
        assert_eq!(lines, vec!["HELLO", "WORLD"]);
    }

    #[test]
    fn test_stderr_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        let ctx = RunContext {
            stdin: StdinMode::Null,
            stderr: StderrMode::File(path.clone()),
        };
        let child = spawn_shell("echo oops >&2", Input::Null, &ctx).unwrap();
        let lines: Vec<_> = OutputLines::new(child, "oops").collect::<ProcessResult<_>>().unwrap();
        assert!(lines.is_empty());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "oops\n");
    }

    #[test]
    fn test_read_all() {
        assert_eq!(Input::Text("abc".to_string()).read_all().unwrap(), "abc");
        assert_eq!(Input::Null.read_all().unwrap(), "");
    }
}
