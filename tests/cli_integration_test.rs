//! CLI integration tests
//!
//! Drive the binaries against the example plugin in `demos/plugins`, with
//! HOME and the configuration directory moved into a temporary directory.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn demo_plugins() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/plugins")
}

fn isolate(mut cmd: Command, home: &Path) -> Command {
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("MARV_YETI_PLUGIN_DIRS", demo_plugins())
        .env_remove("MARV_YETI_DEBUG")
        .env_remove("MARV_YETI_NOTIFY_COMMAND")
        .env_remove("RUST_LOG");
    cmd
}

fn my(home: &Path) -> Command {
    isolate(cargo_bin_cmd!("my"), home)
}

fn my_config(home: &Path) -> Command {
    isolate(cargo_bin_cmd!("my-config"), home)
}

fn my_plugins(home: &Path) -> Command {
    isolate(cargo_bin_cmd!("my-plugins"), home)
}

fn new_note(home: &Path, notebook: &Path, title: &str) {
    my(home)
        .args(["yeti_example", "notes", "new", title, "--notebook"])
        .arg(notebook)
        .assert()
        .success();
}

#[test]
fn test_help_lists_plugins() {
    let home = TempDir::new().unwrap();
    my(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("yeti_example"))
        .stdout(predicate::str::contains("--notify-on-error"));

    my(home.path())
        .args(["yeti_example", "notes", "new", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--notebook"))
        .stdout(predicate::str::contains("--add-date"))
        .stdout(predicate::str::contains("--background"));
}

#[test]
fn test_new_and_list_notes() {
    let home = TempDir::new().unwrap();
    let notebook = home.path().join("notes.txt");

    new_note(home.path(), &notebook, "Buy milk");
    new_note(home.path(), &notebook, "Call Bob");

    let content = std::fs::read_to_string(&notebook).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("# "));
    assert!(lines[0].ends_with(" - Buy milk"));
    assert!(lines[1].ends_with(" - Call Bob"));

    my(home.path())
        .args(["yeti_example", "notes", "list", "--notebook"])
        .arg(&notebook)
        .assert()
        .success()
        .stdout(predicate::str::contains(">>> # "))
        .stdout(predicate::str::contains("Buy milk"));
}

#[test]
fn test_default_notebook_is_expanded_from_home() {
    let home = TempDir::new().unwrap();
    my(home.path())
        .args(["yeti_example", "notes", "new", "In the default notebook"])
        .assert()
        .success();
    let content = std::fs::read_to_string(home.path().join("notes.txt")).unwrap();
    assert!(content.contains("In the default notebook"));
}

#[test]
fn test_piped_count() {
    let home = TempDir::new().unwrap();
    let notebook = home.path().join("notes.txt");
    new_note(home.path(), &notebook, "one");
    new_note(home.path(), &notebook, "two");

    my(home.path())
        .args(["yeti_example", "notes", "count", "--notebook"])
        .arg(&notebook)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^>>> \s*2\n$").unwrap());
}

#[test]
fn test_output_file_and_stdout_echo() {
    let home = TempDir::new().unwrap();
    let notebook = home.path().join("notes.txt");
    let out = home.path().join("out.txt");
    new_note(home.path(), &notebook, "Buy milk");

    my(home.path())
        .args(["yeti_example", "notes", "list", "--notebook"])
        .arg(&notebook)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    my(home.path())
        .args(["yeti_example", "notes", "list", "--stdout", "--notebook"])
        .arg(&notebook)
        .arg("--output-file")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(">>> # "));

    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(!content.contains(">>>"));
}

#[test]
fn test_background_run_returns_immediately() {
    let home = TempDir::new().unwrap();
    let notebook = home.path().join("notes.txt");
    let out = home.path().join("bg.txt");
    new_note(home.path(), &notebook, "Buy milk");

    my(home.path())
        .args(["yeti_example", "notes", "list", "--bg", "--notebook"])
        .arg(&notebook)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let content = std::fs::read_to_string(&out).unwrap_or_default();
        if content.contains("Buy milk") {
            break;
        }
        assert!(Instant::now() < deadline, "background run produced no output");
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn test_failing_process_exit_code() {
    let home = TempDir::new().unwrap();
    my(home.path())
        .args(["yeti_example", "notes", "list", "--notebook"])
        .arg(home.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-zero exit status"));
}

#[test]
fn test_unknown_subcommand_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    my(home.path())
        .args(["yeti_example", "notes", "burn"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_notify_on_success() {
    let home = TempDir::new().unwrap();
    let notebook = home.path().join("notes.txt");
    let log = home.path().join("notifications.txt");
    my(home.path())
        .env(
            "MARV_YETI_NOTIFY_COMMAND",
            format!("echo {{title}} >> {}", log.display()),
        )
        .args(["--notify-on-success", "yeti_example", "notes", "new", "x", "--notebook"])
        .arg(&notebook)
        .assert()
        .success();
    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        "my yeti_example notes new\n"
    );
}

#[test]
fn test_config_init_and_show() {
    let home = TempDir::new().unwrap();
    let conf = home.path().join(".config/marvelous-yeti/my.toml");

    my_config(home.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration created at"));
    assert!(conf.is_file());

    my_config(home.path())
        .arg("init")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "User configuration file already exists",
        ));

    std::fs::write(&conf, "[my]\nnotify_command = \"true\"\n").unwrap();
    my_config(home.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("notify_command = \"true\""));
}

#[test]
fn test_config_without_action() {
    let home = TempDir::new().unwrap();
    my_config(home.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_plugins_listing() {
    let home = TempDir::new().unwrap();
    my_plugins(home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("For plugin 'yeti_example'"))
        .stdout(predicate::str::contains("- new  Create a new note"))
        .stdout(predicate::str::contains("- NewNote"));

    let output = my_plugins(home.path()).arg("--json").output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        value["yeti_example"]["processes"]["notes"]["items"],
        serde_json::json!(["new", "list", "count"])
    );
}
