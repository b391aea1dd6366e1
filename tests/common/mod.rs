//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const PROJECT: &str = "demo-project";

/// Scratch workspace with a persisted local catalog.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("catalog-state.json")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Run `dcflow` against the local backend with this workspace's state.
    pub fn run(&self, args: &[&str]) -> Output {
        let state = self.state_path();
        let mut command = Command::new(env!("CARGO_BIN_EXE_dcflow"));
        command
            .arg("--project")
            .arg(PROJECT)
            .arg("--backend")
            .arg("local")
            .arg("--state")
            .arg(&state)
            .args(args)
            .env_remove("RUST_LOG");
        command.output().expect("run dcflow")
    }

    /// Run and require success, returning stdout.
    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "dcflow {:?} failed\nstdout:\n{}\nstderr:\n{}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("utf-8 stdout")
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut with_json = vec!["--json"];
        with_json.extend_from_slice(args);
        let stdout = self.run_ok(&with_json);
        serde_json::from_str(&stdout).expect("parse JSON output")
    }

    /// Write an emulator state file by hand.
    pub fn write_state(&self, state: &Value) {
        write_json(&self.state_path(), state);
    }
}

pub fn write_json(path: &Path, value: &Value) {
    let text = serde_json::to_string_pretty(value).expect("serialize");
    std::fs::write(path, text).expect("write JSON");
}
