//! Conda CLI command wrappers.
//!
//! Thin layer around the `conda` (or `mamba`/`micromamba`) command-line tool
//! for environment creation and package queries.

use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::command::CommandLine;
use crate::{Error, Result};

/// One entry of `conda list --json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ListedPackage {
    /// Package name.
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Channel the package came from.
    #[serde(default)]
    pub channel: Option<String>,
}

/// Create a new environment at `prefix` containing `spec`.
///
/// # Errors
///
/// Returns an error if conda cannot be started or exits unsuccessfully.
pub fn create_env(conda: &str, prefix: &Path, channel: &str, spec: &str) -> Result<()> {
    debug!(%spec, prefix = %prefix.display(), "Creating conda environment");
    CommandLine::new(conda)
        .args(["create", "--yes", "--quiet", "--prefix"])
        .arg(prefix)
        .args(["--override-channels", "-c", channel, "-c", "conda-forge", spec])
        .run()
}

/// Install `spec` into the existing environment at `prefix`.
///
/// # Errors
///
/// Returns an error if conda cannot be started or exits unsuccessfully.
pub fn install_into(conda: &str, prefix: &Path, channel: &str, spec: &str) -> Result<()> {
    debug!(%spec, prefix = %prefix.display(), "Installing into conda environment");
    CommandLine::new(conda)
        .args(["install", "--yes", "--quiet", "--prefix"])
        .arg(prefix)
        .args(["--override-channels", "-c", channel, "-c", "conda-forge", spec])
        .run()
}

/// List packages in the environment at `prefix` whose name is exactly `package`.
///
/// A missing environment yields an empty list.
///
/// # Errors
///
/// Returns an error if conda cannot be started or prints invalid JSON.
pub fn list_package(conda: &str, prefix: &Path, package: &str) -> Result<Vec<ListedPackage>> {
    let output = Command::new(conda)
        .arg("list")
        .arg("--prefix")
        .arg(prefix)
        .arg("--json")
        .arg(format!("^{package}$"))
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::install_method(format!("conda package {package}"), format!("Failed to run {conda}: {e}")))?;

    // Environment might not exist yet, which is fine
    if !output.status.success() {
        return Ok(Vec::new());
    }

    parse_list_output(&output.stdout).map_err(|e| {
        Error::install_method(
            format!("conda package {package}"),
            format!("Unexpected `{conda} list` output: {e}"),
        )
    })
}

fn parse_list_output(stdout: &[u8]) -> serde_json::Result<Vec<ListedPackage>> {
    serde_json::from_slice(stdout)
}

/// Check whether the conda executable is available.
#[must_use]
pub fn check_available(conda: &str) -> bool {
    CommandLine::new(conda).arg("--version").probe()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_output() {
        let json = br#"[
            {"base_url": "https://conda.anaconda.org/conda-forge", "build_number": 0,
             "build_string": "alldep_h1234", "channel": "conda-forge",
             "dist_name": "git-annex-7.20181105-alldep_h1234",
             "name": "git-annex", "platform": "linux-64", "version": "7.20181105"}
        ]"#;
        let packages = parse_list_output(json).unwrap();
        assert_eq!(
            packages,
            vec![ListedPackage {
                name: "git-annex".into(),
                version: "7.20181105".into(),
                channel: Some("conda-forge".into()),
            }]
        );
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_list_output(b"[]").unwrap().is_empty());
        assert!(parse_list_output(b"not json").is_err());
    }

    #[test]
    fn test_check_available_missing_binary() {
        assert!(!check_available("/nonexistent/toolshed-conda"));
    }
}
