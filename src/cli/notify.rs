//! Desktop notifications at the end of a run

use crate::process::{shell_quote, Process, ProcessResult, RunContext};
use tracing::{debug, warn};

/// Runs the configured notification command.
///
/// `{title}` and `{body}` in the command are replaced by the shell-quoted
/// title and body.
#[derive(Debug, Clone)]
pub struct Notifier {
    command: String,
}

impl Notifier {
    /// Notifier running `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Command line sent for a notification.
    pub fn command_line(&self, title: &str, body: &str) -> String {
        self.command
            .replace("{title}", &shell_quote(title))
            .replace("{body}", &shell_quote(body))
    }

    fn send(&self, title: &str, body: &str) -> ProcessResult<()> {
        let line = self.command_line(title, body);
        debug!("Notifying with: {}", line);
        for output in Process::command(line.as_str()).run(&RunContext::quiet())? {
            output?;
        }
        Ok(())
    }

    /// Send a notification.
    ///
    /// Failures are logged and reported as `false`; they never abort the
    /// caller.
    pub fn notify(&self, title: &str, body: &str) -> bool {
        match self.send(title, body) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send notification '{}': {}", title, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes() {
        let notifier = Notifier::new("notify-send {title} {body}");
        assert_eq!(
            notifier.command_line("my net ip", "done"),
            "notify-send 'my net ip' done"
        );
    }

    #[test]
    fn test_notify_writes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notifications");
        let notifier = Notifier::new(format!("echo {{title}}:{{body}} >> {}", file.display()));
        assert!(notifier.notify("ok", "it worked"));
        let content = std::fs::read_to_string(&file).unwrap();
        assert_eq!(content, "ok:it worked\n");
    }

    #[test]
    fn test_notify_failure_is_not_fatal() {
        assert!(!Notifier::new("exit 4").notify("title", "body"));
    }
}
