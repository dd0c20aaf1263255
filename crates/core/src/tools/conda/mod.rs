//! Conda package install method.
//!
//! Each tool gets its own named environment under
//! `<tools_dir>/conda-envs/<env>`, so tools with conflicting dependencies
//! never share a prefix. The executable is expected at `<env>/bin/<name>`.

pub mod commands;

use std::path::PathBuf;
use tracing::{debug, info};

use super::method::{VerifyProbe, is_executable};
use crate::config::Settings;
use crate::Result;

/// Default channel for packages that do not name one.
pub const DEFAULT_CHANNEL: &str = "bioconda";

/// A package installed into an isolated conda environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondaPackage {
    package: String,
    version: Option<String>,
    channel: String,
    env: String,
    executable: String,
    verify: Option<Vec<String>>,
    conda: String,
    envs_dir: PathBuf,
}

impl CondaPackage {
    /// Declare `package`, using conda and the environment root from `settings`.
    #[must_use]
    pub fn new(package: impl Into<String>, settings: &Settings) -> Self {
        let package = package.into();
        Self {
            env: format!("toolshed-{package}-env"),
            executable: package.clone(),
            package,
            version: None,
            channel: DEFAULT_CHANNEL.to_string(),
            verify: None,
            conda: settings.conda.clone(),
            envs_dir: settings.conda_envs_dir(),
        }
    }

    /// Require an exact version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Install from `channel` (conda-forge is always added as a fallback).
    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Name of the environment.
    #[must_use]
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// Executable name inside the environment's `bin/`, if not the package name.
    #[must_use]
    pub fn executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Arguments that make the executable exit 0 when it works.
    #[must_use]
    pub fn verify_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verify = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Package name.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Declared version, if any.
    #[must_use]
    pub fn declared_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Environment prefix directory.
    #[must_use]
    pub fn prefix(&self) -> PathBuf {
        self.envs_dir.join(&self.env)
    }

    pub(crate) fn verify_probe(&self) -> VerifyProbe {
        match &self.verify {
            Some(args) => VerifyProbe::Run(args.clone()),
            None => VerifyProbe::Executable,
        }
    }

    fn spec(&self) -> String {
        match &self.version {
            Some(version) => format!("{}={}", self.package, version),
            None => self.package.clone(),
        }
    }

    /// Installed version of the package in the environment, if present.
    fn installed_version(&self) -> Option<String> {
        commands::list_package(&self.conda, &self.prefix(), &self.package)
            .ok()?
            .into_iter()
            .find(|p| p.name == self.package)
            .map(|p| p.version)
    }

    pub(crate) fn is_already_installed(&self) -> bool {
        if !is_executable(&self.executable_path()) {
            return false;
        }
        let Some(wanted) = &self.version else {
            return true;
        };
        match self.installed_version() {
            Some(found) if &found == wanted => true,
            found => {
                debug!(
                    package = %self.package,
                    %wanted,
                    ?found,
                    "Conda environment does not satisfy version"
                );
                false
            }
        }
    }

    pub(crate) fn attempt_install(&self) -> Result<()> {
        if !commands::check_available(&self.conda) {
            return Err(crate::Error::install_method(
                self.to_string(),
                format!("package manager '{}' is not available", self.conda),
            ));
        }
        let prefix = self.prefix();
        let spec = self.spec();
        info!(%spec, channel = %self.channel, prefix = %prefix.display(), "Installing conda package");
        if prefix.join("conda-meta").is_dir() {
            commands::install_into(&self.conda, &prefix, &self.channel, &spec)
        } else {
            std::fs::create_dir_all(&self.envs_dir).map_err(|e| {
                crate::Error::io(e, Some(self.envs_dir.as_path()), "creating conda envs directory")
            })?;
            commands::create_env(&self.conda, &prefix, &self.channel, &spec)
        }
    }

    pub(crate) fn executable_path(&self) -> PathBuf {
        self.prefix().join("bin").join(&self.executable)
    }
}

impl std::fmt::Display for CondaPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{} in env {}", self.channel, self.spec(), self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut settings = Settings::with_tools_dir("/opt/tools");
        settings.conda = "/nonexistent/toolshed-conda".into();
        settings
    }

    #[test]
    fn test_defaults() {
        let pkg = CondaPackage::new("mvicuna", &settings());
        assert_eq!(pkg.package(), "mvicuna");
        assert_eq!(pkg.prefix(), PathBuf::from("/opt/tools/conda-envs/toolshed-mvicuna-env"));
        assert_eq!(
            pkg.executable_path(),
            PathBuf::from("/opt/tools/conda-envs/toolshed-mvicuna-env/bin/mvicuna")
        );
        assert_eq!(pkg.verify_probe(), VerifyProbe::Executable);
        assert_eq!(pkg.to_string(), "bioconda::mvicuna in env toolshed-mvicuna-env");
    }

    #[test]
    fn test_builder() {
        let pkg = CondaPackage::new("git-annex", &settings())
            .version("7.20181105")
            .channel("conda-forge")
            .env("custom-annex-env")
            .verify_args(["version"]);
        assert_eq!(pkg.declared_version(), Some("7.20181105"));
        assert_eq!(pkg.spec(), "git-annex=7.20181105");
        assert_eq!(pkg.verify_probe(), VerifyProbe::run(["version"]));
        assert_eq!(
            pkg.to_string(),
            "conda-forge::git-annex=7.20181105 in env custom-annex-env"
        );
    }

    #[test]
    fn test_not_installed_when_env_missing() {
        let pkg = CondaPackage::new("samtools", &settings()).version("1.9");
        assert!(!pkg.is_already_installed());
    }

    #[test]
    fn test_install_fails_without_conda() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::with_tools_dir(dir.path());
        settings.conda = "/nonexistent/toolshed-conda".into();
        let pkg = CondaPackage::new("samtools", &settings);
        let err = pkg.attempt_install().unwrap_err();
        assert!(err.to_string().contains("is not available"));
    }
}
