//! Plugin integration tests
//!
//! These tests load plugin directories from disk and run what they export.

use clap::Command;
use std::path::PathBuf;
use tempfile::TempDir;
use yeti::arguments::{ExposeArguments, IncludeFields};
use yeti::plugins::{ManifestSource, PluginError, PluginLoader};
use yeti::process::{Process, RunContext};
use yeti::tree::TreeError;

fn demo_plugins() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/plugins")
}

fn write_plugin(root: &TempDir, dir: &str, manifest: &str) {
    let plugin_dir = root.path().join(dir);
    std::fs::create_dir_all(&plugin_dir).unwrap();
    std::fs::write(plugin_dir.join("plugin.toml"), manifest).unwrap();
}

fn apply(process: &Process, argv: &[&str]) -> Process {
    let cmd = process
        .add_arguments(Command::new("test").no_binary_name(true), IncludeFields::All)
        .unwrap();
    let matches = cmd.try_get_matches_from(argv).unwrap();
    let values = process.extract_arguments(&matches, IncludeFields::All).unwrap();
    process.with_arguments(&values).unwrap()
}

/// Test loading the example plugin shipped in demos/
#[test]
fn test_load_demo_plugin() {
    let source = ManifestSource::scan([demo_plugins()]);
    assert_eq!(source.manifests().len(), 1);

    let mut loader = PluginLoader::new();
    loader.load_plugins(&[&source]).unwrap();

    let plugin = loader.plugin("yeti_example").unwrap();
    assert_eq!(plugin.module, "yeti_example.processes");
    assert_eq!(
        plugin.to_string(),
        "<Plugin yeti_example: commands=2, processes=3>"
    );
    assert_eq!(
        loader.processes_tree(),
        "yeti_example\n  notes\n    - new  Create a new note\n    - list  List notes\n    - count  Count notes\n"
    );
    // Command classes are reachable by their leaf name
    assert_eq!(plugin.command("NewNote").unwrap().class.name(), "NewNote");
}

/// Test preparing a demo process from parsed arguments
#[test]
fn test_prepare_demo_process() {
    let source = ManifestSource::scan([demo_plugins()]);
    let mut loader = PluginLoader::new();
    loader.load_plugins(&[&source]).unwrap();
    let plugin = loader.plugin("yeti_example").unwrap();

    let list = &plugin.process("notes.list").unwrap().process;
    let prepared = apply(list, &["--notebook", "/tmp/yeti notes.txt"]);
    assert_eq!(prepared.command_line().unwrap(), "cat '/tmp/yeti notes.txt'");

    let new = &plugin.process("notes.new").unwrap().process;
    let prepared = apply(new, &["Buy milk", "--notebook", "/tmp/n.txt"]);
    let line = prepared.command_line().unwrap();
    assert!(line.starts_with("note='Buy milk'; if true; then"));
    assert!(line.ends_with(">> /tmp/n.txt"));
}

/// Test running a process loaded from a manifest
#[test]
fn test_run_manifest_process() {
    let root = TempDir::new().unwrap();
    write_plugin(
        &root,
        "words",
        r#"
[plugin]
module = "words.processes"

[[process]]
entrypoint = "text__upper"
piped = true
steps = [
    { command = "printf 'b\\na\\n'" },
    { command = "sort" },
    { command = "tr a-z A-Z" },
]
"#,
    );

    let source = ManifestSource::scan([root.path()]);
    let mut loader = PluginLoader::new();
    loader.load_plugins(&[&source]).unwrap();

    let process = &loader.plugin("words").unwrap().process("upper").unwrap().process;
    let lines = process
        .run(&RunContext::quiet())
        .unwrap()
        .collect_lines()
        .unwrap();
    assert_eq!(lines, vec!["A", "B"]);
}

/// Test that an invalid manifest does not prevent others from loading
#[test]
fn test_invalid_manifest_is_skipped() {
    let root = TempDir::new().unwrap();
    write_plugin(&root, "broken", "[plugin]\n");
    write_plugin(
        &root,
        "good",
        "[plugin]\nmodule = \"good\"\n\n[[process]]\nentrypoint = \"hello\"\ncommand = \"echo hello\"\n",
    );

    let source = ManifestSource::scan([root.path(), root.path().join("missing").as_path()]);
    assert_eq!(source.manifests().len(), 1);

    let mut loader = PluginLoader::new();
    loader.load_plugins(&[&source]).unwrap();
    assert_eq!(loader.plugins().len(), 1);
    assert!(loader.plugin("broken").is_err());
}

/// Test that two directories sharing a plugin name merge, and collide
#[test]
fn test_plugins_merge_across_directories() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_plugin(
        &first,
        "net",
        "[plugin]\nmodule = \"net.a\"\n\n[[process]]\nentrypoint = \"ip\"\ncommand = \"true\"\n",
    );
    write_plugin(
        &second,
        "net",
        "[plugin]\nmodule = \"net.b\"\n\n[[process]]\nentrypoint = \"dns__flush\"\ncommand = \"true\"\n",
    );

    let source = ManifestSource::scan([first.path(), second.path()]);
    let mut loader = PluginLoader::new();
    loader.load_plugins(&[&source]).unwrap();
    assert_eq!(loader.plugin("net").unwrap().processes().len(), 2);

    write_plugin(
        &second,
        "net2",
        "[plugin]\nmodule = \"net.c\"\n\n[[process]]\nentrypoint = \"ip__v6\"\ncommand = \"true\"\n",
    );
    let source = ManifestSource::scan([first.path(), second.path()]);
    let err = PluginLoader::new().load_plugins(&[&source]).unwrap_err();
    assert!(matches!(
        err,
        PluginError::Tree(TreeError::NameCollision { .. })
    ));
}
