//! End-to-end runs of the `x` binary against a fake build tool.
//!
//! The fake tool is a shell script that records its arguments and the
//! variables we care about, then exits with `$FAKE_EXIT` (or kills itself
//! when `FAKE_SIGNAL` is set).

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Mutex;
use tempfile::TempDir;

// Writing an executable while another thread forks can leave the fd open in
// the child and make exec fail with ETXTBSY.
static FORK_LOCK: Mutex<()> = Mutex::new(());

const FAKE_TOOL: &str = r#"#!/bin/sh
printf '%s\n' "$@" > args.txt
printf '%s' "${RUSTFLAGS-<unset>}" > rustflags.txt
printf '%s' "${RUST_TEST_THREADS-<unset>}" > threads.txt
if [ -n "$FAKE_SIGNAL" ]; then
    kill -KILL $$
fi
exit "${FAKE_EXIT:-0}"
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// A scratch dir with the fake tool and an x.toml pointing at it.
    /// `extra` is appended to the generated x.toml.
    fn new(extra: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fake-cargo");
        {
            let _guard = FORK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
            fs::write(&tool, FAKE_TOOL).unwrap();
            fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        }
        let config = format!("tool = {:?}\n{extra}", tool.display().to_string());
        fs::write(dir.path().join("x.toml"), config).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn tool(&self) -> PathBuf {
        self.path().join("fake-cargo")
    }

    fn x(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_x"));
        cmd.args(args)
            .current_dir(self.path())
            .env_remove("RUSTFLAGS")
            .env_remove("RUST_TEST_THREADS")
            .env_remove("X_VERBOSE")
            .env_remove("FAKE_EXIT")
            .env_remove("FAKE_SIGNAL");
        cmd
    }

    fn run(&self, cmd: &mut Command) -> Output {
        let _guard = FORK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        cmd.output().unwrap()
    }

    fn ran(&self) -> bool {
        self.path().join("args.txt").exists()
    }

    /// Arguments the fake tool received (the action first).
    fn args(&self) -> Vec<String> {
        fs::read_to_string(self.path().join("args.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn recorded(&self, file: &str) -> String {
        fs::read_to_string(self.path().join(file)).unwrap()
    }
}

#[test]
fn test_test_lib_scenario() {
    let ws = Workspace::new("");
    let out = ws.run(&mut ws.x(&["test", "--lib"]));
    assert!(out.status.success(), "{out:?}");
    assert_eq!(ws.args(), vec!["test", "--features", "debug-alloc,stats", "--lib"]);
    assert_eq!(ws.recorded("threads.txt"), "1");
    assert_eq!(ws.recorded("rustflags.txt"), "<unset>");
}

#[test]
fn test_bench_scenario_extends_rustflags() {
    let ws = Workspace::new("");
    let out = ws.run(ws.x(&["bench"]).env("RUSTFLAGS", "-Dwarnings"));
    assert!(out.status.success(), "{out:?}");
    assert_eq!(ws.args(), vec!["bench"]);
    assert_eq!(ws.recorded("rustflags.txt"), "-Dwarnings -Ctarget-cpu=native");
    assert_eq!(ws.recorded("threads.txt"), "<unset>");
}

#[test]
fn test_build_release_scenario() {
    let ws = Workspace::new("");
    let out = ws.run(ws.x(&["build", "--release"]).env("RUSTFLAGS", "-g"));
    assert!(out.status.success(), "{out:?}");
    assert_eq!(ws.args(), vec!["build", "--release"]);
    assert_eq!(ws.recorded("rustflags.txt"), "-g");
    assert_eq!(ws.recorded("threads.txt"), "<unset>");
}

#[test]
fn test_htm_preset_from_config() {
    let ws = Workspace::new("preset = \"htm\"\n");
    let out = ws.run(&mut ws.x(&["doc", "--no-deps"]));
    assert!(out.status.success(), "{out:?}");
    assert_eq!(ws.args(), vec!["doc", "--features", "rtm", "--no-deps"]);
    assert_eq!(
        ws.recorded("rustflags.txt"),
        "-Ctarget-feature=+rtm -Ctarget-cpu=native"
    );
    assert_eq!(ws.recorded("threads.txt"), "<unset>");
}

#[test]
fn test_preset_flag_overrides_config() {
    let ws = Workspace::new("preset = \"htm\"\n");
    let out = ws.run(&mut ws.x(&["--preset", "rbtree", "test"]));
    assert!(out.status.success(), "{out:?}");
    assert_eq!(ws.args(), vec!["+nightly", "test", "--features", "stats"]);
}

#[test]
fn test_trailing_args_are_verbatim() {
    let ws = Workspace::new("");
    let trailing = ["-v", "--help", "with space", "--", "--nocapture", ""];
    let mut argv = vec!["clippy"];
    argv.extend(trailing);
    let out = ws.run(&mut ws.x(&argv));
    assert!(out.status.success(), "{out:?}");
    let mut expected = vec!["clippy".to_string()];
    expected.extend(trailing.iter().map(|s| s.to_string()));
    assert_eq!(ws.args(), expected);
}

#[test]
fn test_child_exit_code_fails_dispatch() {
    let ws = Workspace::new("");
    let out = ws.run(ws.x(&["test"]).env("FAKE_EXIT", "101"));
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("test` failed"), "{stderr}");
}

#[test]
fn test_child_signal_fails_dispatch() {
    let ws = Workspace::new("");
    let out = ws.run(ws.x(&["bench"]).env("FAKE_SIGNAL", "1"));
    assert!(ws.ran());
    assert!(!out.status.success());
    assert!(out.status.code().is_some_and(|c| c != 0), "{out:?}");
}

#[test]
fn test_missing_tool_fails() {
    let ws = Workspace::new("");
    fs::write(ws.path().join("x.toml"), "tool = \"/nonexistent/cargo\"\n").unwrap();
    let out = ws.run(&mut ws.x(&["build"]));
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Failed to run"), "{stderr}");
}

#[test]
fn test_missing_action_spawns_nothing() {
    let ws = Workspace::new("");
    let out = ws.run(&mut ws.x(&[]));
    assert!(!out.status.success());
    assert!(!ws.ran());

    let out = ws.run(&mut ws.x(&["--verbose"]));
    assert!(!out.status.success());
    assert!(!ws.ran());
}

#[test]
fn test_dry_run_prints_and_does_not_spawn() {
    let ws = Workspace::new("");
    let out = ws.run(&mut ws.x(&["--dry-run", "test", "--lib"]));
    assert!(out.status.success(), "{out:?}");
    assert!(!ws.ran());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(
        stdout.trim_end(),
        format!(
            "RUST_TEST_THREADS=1 {} test --features debug-alloc,stats --lib",
            ws.tool().display()
        )
    );
}

#[test]
fn test_verbose_logs_to_stderr() {
    let ws = Workspace::new("");
    let out = ws.run(ws.x(&["build"]).env("X_VERBOSE", "1"));
    assert!(out.status.success(), "{out:?}");
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("[info] Preset: swym"), "{stderr}");
    assert!(stderr.contains("[info] Running:"), "{stderr}");
}

#[test]
fn test_broken_config_fails_before_spawn() {
    let ws = Workspace::new("preset = \"nope\"\n");
    let out = ws.run(&mut ws.x(&["build"]));
    assert!(!out.status.success());
    assert!(!ws.ran());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("x.toml"), "{stderr}");
}
