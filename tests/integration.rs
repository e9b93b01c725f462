//! Integration tests for the run-tool CLI.
//!
//! A shell script stands in for the clang tool: it echoes its arguments on
//! stdout and fails on any file named `y.cc`.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

const FAKE_TOOL: &str = r#"#!/bin/sh
case "$3" in
  *y.cc) echo "boom on $3" >&2; exit 1 ;;
esac
echo "out:$*"
"#;

/// Get a command for the run-tool binary.
fn run_tool() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("run-tool").unwrap()
}

/// A scratch checkout: `bin/fake-tool`, `out/compile_commands.json` naming
/// `sources` under `src/`.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(sources: &[&str]) -> Self {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        let tool = bin.join("fake-tool");
        std::fs::write(&tool, FAKE_TOOL).unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let src = dir.path().join("src");
        let entries: Vec<String> = sources
            .iter()
            .map(|file| {
                format!(
                    r#"{{"directory": "{}", "file": "{}", "command": "clang++ -c {}"}}"#,
                    src.display(),
                    file,
                    file
                )
            })
            .collect();
        std::fs::write(
            out.join("compile_commands.json"),
            format!("[{}]", entries.join(",\n")),
        )
        .unwrap();

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn out(&self) -> PathBuf {
        self.path().join("out")
    }

    fn bin(&self) -> PathBuf {
        self.path().join("bin")
    }

    /// `run-tool --tool fake-tool -p out --tool-path bin -q`.
    fn command(&self) -> Command {
        let mut cmd = run_tool();
        cmd.current_dir(self.path())
            .env_remove("RUN_TOOL_PATH")
            .arg("--tool")
            .arg("fake-tool")
            .arg("-p")
            .arg(self.out())
            .arg("--tool-path")
            .arg(self.bin())
            .arg("-q");
        cmd
    }
}

#[test]
fn test_help_displays() {
    run_tool()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--tool"))
        .stdout(predicate::str::contains("--shard"))
        .stdout(predicate::str::contains("--options-file"));
}

#[test]
fn test_all_files_succeed() {
    let ws = Workspace::new(&["a/x.cc", "b/z.cc"]);
    ws.command()
        .arg("--all")
        .assert()
        .success()
        .stdout(predicate::str::contains("a/x.cc"))
        .stdout(predicate::str::contains("b/z.cc"))
        .stderr(predicate::str::contains("Failed to process").not());
}

#[test]
fn test_failing_file_sets_exit_status() {
    let ws = Workspace::new(&["a/x.cc", "a/y.cc"]);
    ws.command()
        .arg("--all")
        .assert()
        // -1 truncated to eight bits
        .code(255)
        .stdout(predicate::str::contains("a/x.cc"))
        .stdout(predicate::str::contains("y.cc").not())
        .stderr(predicate::str::contains("Failed to process"))
        .stderr(predicate::str::contains("boom on"));
}

#[test]
fn test_tool_receives_build_dir_and_extra_args() {
    let ws = Workspace::new(&["a/x.cc"]);
    ws.command()
        .arg("--all")
        .arg("--tool-arg")
        .arg("--method-blocklist=foo")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("out:-p {}", ws.out().display())))
        .stdout(predicate::str::contains("a/x.cc --method-blocklist=foo"));
}

#[test]
fn test_shard_selects_every_other_file() {
    let ws = Workspace::new(&["a.cc", "b.cc", "c.cc"]);
    ws.command()
        .arg("--all")
        .arg("--shard")
        .arg("1-of-2")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.cc"))
        .stdout(predicate::str::contains("c.cc"))
        .stdout(predicate::str::contains("b.cc").not())
        .stderr(predicate::str::contains(
            "Shard 1-of-2 will process 2 entries out of 3",
        ))
        .stderr(predicate::str::contains("Shard 1-of-2: 2 succeeded, 0 failed"));
}

#[test]
fn test_invalid_shard_rejected() {
    let ws = Workspace::new(&["a.cc"]);
    ws.command()
        .arg("--all")
        .arg("--shard")
        .arg("4-of-3")
        .assert()
        .failure()
        .stderr(predicate::str::contains("4-of-3"));
}

#[test]
fn test_missing_tool() {
    let ws = Workspace::new(&["a.cc"]);
    run_tool()
        .current_dir(ws.path())
        .arg("--tool")
        .arg("no-such-tool")
        .arg("-p")
        .arg(ws.out())
        .arg("--tool-path")
        .arg(ws.bin())
        .arg("--all")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Tool not found"))
        .stderr(predicate::str::contains("--tool-path"));
}

#[test]
fn test_tool_path_from_environment() {
    let ws = Workspace::new(&["a/x.cc"]);
    run_tool()
        .current_dir(ws.path())
        .env("RUN_TOOL_PATH", ws.bin())
        .args(["--tool", "fake-tool", "-q", "--all", "-p"])
        .arg(ws.out())
        .assert()
        .success()
        .stdout(predicate::str::contains("a/x.cc"));
}

#[test]
fn test_missing_compile_database() {
    let ws = Workspace::new(&[]);
    std::fs::remove_file(ws.out().join("compile_commands.json")).unwrap();
    ws.command()
        .arg("--all")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("compile_commands.json"));
}

#[test]
fn test_empty_selection_succeeds() {
    let ws = Workspace::new(&[]);
    ws.command()
        .arg("--all")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_options_file_replaces_arguments() {
    let ws = Workspace::new(&["a/x.cc"]);
    let options = ws.path().join("options.txt");
    std::fs::write(
        &options,
        format!(
            "--tool fake-tool\n-p {}\n--tool-path {}\n--all -q\n",
            ws.out().display(),
            ws.bin().display()
        ),
    )
    .unwrap();

    run_tool()
        .current_dir(ws.path())
        .env_remove("RUN_TOOL_PATH")
        // Without the options file these arguments would fail to parse.
        .arg("--bogus")
        .arg("--options-file")
        .arg(&options)
        .assert()
        .success()
        .stdout(predicate::str::contains("a/x.cc"));
}

#[test]
fn test_missing_options_file() {
    let ws = Workspace::new(&[]);
    run_tool()
        .current_dir(ws.path())
        .arg("--options-file")
        .arg(ws.path().join("nope.txt"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("options file"));
}

#[test]
fn test_exact_file_filters_skip_git() {
    // Not a git checkout: only exact files can be selected.
    let ws = Workspace::new(&[]);
    let src = ws.path().join("src");
    std::fs::create_dir(&src).unwrap();
    std::fs::write(src.join("only.cc"), "").unwrap();
    std::fs::write(src.join("only.h"), "").unwrap();

    ws.command()
        .arg("src/only.cc")
        .arg("src/only.h")
        .assert()
        .success()
        .stdout(predicate::str::contains("only.cc"))
        .stdout(predicate::str::contains("only.h").not());
}

#[test]
fn test_prefix_filter_outside_git_fails() {
    let ws = Workspace::new(&[]);
    ws.command()
        .arg("src/")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("git ls-files failed"));
}
