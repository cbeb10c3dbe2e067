//! Common test utilities for planstack integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/planstack/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with an isolated data directory.
///
/// The `ps()` method returns a `Command` that sets `PLANSTACK_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment seeded with demo data.
    pub fn init() -> Self {
        let env = Self::new();
        env.ps().args(["system", "init"]).assert().success();
        env
    }

    /// Get a Command for the planstack binary with isolated data directory.
    pub fn ps(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_planstack"));
        cmd.env("PLANSTACK_DATA_DIR", self.data_dir.path());
        cmd.env_remove("PLANSTACK_LOG");
        cmd
    }

    /// Run a command that must succeed and parse its JSON output.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.ps().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    pub fn state_file(&self) -> std::path::PathBuf {
        self.data_dir.path().join("planstack-storage.json")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
