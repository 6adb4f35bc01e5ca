//! Common test utilities and helpers

#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "ERRBRAKE_ENDPOINT",
    "ERRBRAKE_PROJECT_ID",
    "ERRBRAKE_PROJECT_KEY",
    "ERRBRAKE_ENVIRONMENT",
    "ERRBRAKE_TIMEOUT_SECS",
    "ERRBRAKE_PROJECT",
    "RUST_LOG",
];

/// Test command builder for the errbrake CLI
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    pub fn new() -> Self {
        let mut cmd = Command::cargo_bin("errbrake").expect("Failed to find errbrake binary");
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        Self { cmd }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.cmd.arg(arg.as_ref());
        }
        self
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg.as_ref());
        self
    }

    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.cmd.env(key.as_ref(), val.as_ref());
        self
    }

    pub fn stdin<S: AsRef<str>>(mut self, input: S) -> Self {
        self.cmd.write_stdin(input.as_ref());
        self
    }

    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    pub fn expect_failure(mut self) -> TestAssertion {
        let assert = self.cmd.assert().failure();
        TestAssertion { assert }
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    pub fn stdout_contains_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.assert = self.assert.stdout(predicate::str::contains(pattern.as_ref()));
        }
        Self { assert: self.assert }
    }

    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// Isolated project directory and home directory
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub home_dir: TempDir,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let home_dir = TempDir::new().expect("Failed to create home directory");
        let config_path = temp_dir.path().join(".errbrake/config.toml");

        Self {
            temp_dir,
            home_dir,
            config_path,
        }
    }

    pub fn init_config(&self) -> TestAssertion {
        self.command().arg("init").expect_success()
    }

    pub fn project_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Command with `--project` and `HOME` pointing into this environment
    pub fn command(&self) -> TestCommand {
        TestCommand::new()
            .env("HOME", self.home_dir.path().to_string_lossy())
            .arg("--project")
            .arg(self.project_path().to_string_lossy())
    }

    pub fn write_config(&self, content: &str) {
        std::fs::create_dir_all(self.config_path.parent().expect("config dir"))
            .expect("Failed to create config directory");
        std::fs::write(&self.config_path, content).expect("Failed to write config");
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Assertion helpers for common patterns
pub mod assertions {
    pub fn assert_path_exists<P: AsRef<std::path::Path>>(path: P) {
        assert!(
            path.as_ref().exists(),
            "Path should exist: {}",
            path.as_ref().display()
        );
    }
}
