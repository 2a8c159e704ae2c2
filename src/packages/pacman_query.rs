// src/packages/pacman_query.rs

//! Query the local pacman database
//!
//! Reverse dependencies come from `pactree -r -u`, foreign packages from
//! `pacman -Qmq`, and broken linkage from `checkrebuild` (rebuild-detector).

use crate::error::{Error, Result};
use crate::packages::{InstalledPackage, LinkageDetector, PackageSource};
use std::process::{Command, Output, Stdio};
use tracing::debug;

/// `PackageSource` backed by pacman and pactree
#[derive(Debug, Clone, Default)]
pub struct PacmanSource;

impl PacmanSource {
    pub fn new() -> Self {
        Self
    }
}

impl PackageSource for PacmanSource {
    fn reverse_dependencies(&self, package: &str) -> Result<Vec<String>> {
        debug!("Querying reverse dependencies of {}", package);

        let output = run("pactree", &["-r", "-u", package])?;

        // pactree exits 1 when the package is not installed
        if output.status.code() == Some(1) {
            debug!("pactree: {} is not installed", package);
            return Ok(Vec::new());
        }
        check_status("pactree", &output)?;

        let deps = parse_reverse_deps(&String::from_utf8_lossy(&output.stdout), package);
        debug!("Found {} reverse dependencies of {}", deps.len(), package);
        Ok(deps)
    }

    fn foreign_packages(&self) -> Result<Vec<InstalledPackage>> {
        debug!("Querying installed foreign packages");

        let output = run("pacman", &["-Qmq"])?;

        // pacman exits 1 with no output when there are no foreign packages
        if output.status.code() == Some(1) && output.stdout.is_empty() {
            return Ok(Vec::new());
        }
        check_status("pacman", &output)?;

        let packages = parse_package_list(&String::from_utf8_lossy(&output.stdout));
        debug!("Found {} foreign packages", packages.len());
        Ok(packages)
    }
}

/// `LinkageDetector` backed by `checkrebuild`
#[derive(Debug, Clone, Default)]
pub struct Checkrebuild;

impl LinkageDetector for Checkrebuild {
    fn broken_packages(&self) -> Result<Vec<String>> {
        debug!("Running checkrebuild");

        let output = run("checkrebuild", &[])?;
        check_status("checkrebuild", &output)?;

        Ok(parse_checkrebuild(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn run(tool: &str, args: &[&str]) -> Result<Output> {
    Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::external(tool, format!("failed to run: {}", e)))
}

fn check_status(tool: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = output
        .status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    Err(Error::external(
        tool,
        format!("exited with code {}: {}", code, stderr.trim()),
    ))
}

/// Parse `pactree -u` output, dropping the queried package itself
fn parse_reverse_deps(stdout: &str, package: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != package)
        .map(str::to_string)
        .collect()
}

/// Parse `pacman -Qmq` output
fn parse_package_list(stdout: &str) -> Vec<InstalledPackage> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(InstalledPackage::new)
        .collect()
}

/// Parse `checkrebuild` output: `<repo> <package>` or bare package names
fn parse_checkrebuild(stdout: &str) -> Vec<String> {
    let mut packages: Vec<String> = Vec::new();
    for line in stdout.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let name = match fields.as_slice() {
            [] => continue,
            [name] => *name,
            [_repo, name, ..] => *name,
        };
        if !packages.iter().any(|p| p == name) {
            packages.push(name.to_string());
        }
    }
    packages
}
