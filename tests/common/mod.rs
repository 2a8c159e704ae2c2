// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use rekindle::PackageName;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch database path and configuration directory.
///
/// Keep the value alive for the duration of the test; dropping it removes
/// the directory.
pub struct Sandbox {
    pub dir: TempDir,
    pub db_path: PathBuf,
    pub conf_dir: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state").join("rekindle.db");
        let conf_dir = dir.path().join("conf");
        std::fs::create_dir_all(&conf_dir).unwrap();
        Self {
            dir,
            db_path,
            conf_dir,
        }
    }

    /// Write a trigger-scoped override file
    pub fn trigger_override(&self, trigger: &str, contents: &str) {
        write_file(&self.conf_dir.join("triggers"), trigger, contents);
    }

    /// Write a package-scoped override file
    pub fn package_override(&self, package: &str, contents: &str) {
        write_file(&self.conf_dir.join("packages"), package, contents);
    }

    pub fn config(&self, contents: &str) {
        std::fs::write(self.conf_dir.join("config.toml"), contents).unwrap();
    }

    /// Run the binary against this sandbox
    pub fn run(&self, args: &[&str]) -> Output {
        self.run_with_stdin(args, "")
    }

    pub fn run_with_stdin(&self, args: &[&str], stdin: &str) -> Output {
        use std::io::Write;
        use std::process::Stdio;

        let mut child = Command::new(env!("CARGO_BIN_EXE_rekindle"))
            .arg("--db-path")
            .arg(&self.db_path)
            .arg("--conf-dir")
            .arg(&self.conf_dir)
            .args(args)
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        child
            .stdin
            .take()
            .unwrap()
            .write_all(stdin.as_bytes())
            .unwrap();
        child.wait_with_output().unwrap()
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(format!("{}.conf", name)), contents).unwrap();
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn name(s: &str) -> PackageName {
    PackageName::parse(s).unwrap()
}

pub fn names(list: &[&str]) -> Vec<PackageName> {
    list.iter().map(|s| name(s)).collect()
}
