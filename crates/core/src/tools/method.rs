//! Install methods: the strategies a [`ToolHandle`](super::ToolHandle) tries in order.

use std::cell::{Cell, OnceCell};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::conda::CondaPackage;
use super::download::DownloadInstall;
use super::preexisting::PreexistingBinary;
use crate::command::CommandLine;
use crate::{Error, Result};

/// Source-specific installation data.
#[derive(Debug, Clone)]
pub enum InstallSource {
    /// Isolated conda environment containing the package.
    Conda(CondaPackage),
    /// Binary already present at a fixed path.
    Preexisting(PreexistingBinary),
    /// Release artifact fetched over HTTP.
    Download(DownloadInstall),
}

impl InstallSource {
    /// Short kind name, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Conda(_) => "conda",
            Self::Preexisting(_) => "preexisting",
            Self::Download(_) => "download",
        }
    }

    fn is_already_installed(&self) -> bool {
        match self {
            Self::Conda(pkg) => pkg.is_already_installed(),
            Self::Preexisting(bin) => bin.is_already_installed(),
            Self::Download(dl) => dl.is_already_installed(),
        }
    }

    fn attempt_install(&self) -> Result<()> {
        match self {
            Self::Conda(pkg) => pkg.attempt_install(),
            Self::Preexisting(_) => Ok(()),
            Self::Download(dl) => dl.attempt_install(),
        }
    }

    fn executable_path(&self) -> Option<PathBuf> {
        match self {
            Self::Conda(pkg) => Some(pkg.executable_path()),
            Self::Preexisting(bin) => bin.executable_path(),
            Self::Download(dl) => Some(dl.executable_path()),
        }
    }
}

impl std::fmt::Display for InstallSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conda(pkg) => write!(f, "conda package {pkg}"),
            Self::Preexisting(bin) => write!(f, "preexisting binary {bin}"),
            Self::Download(dl) => write!(f, "download {dl}"),
        }
    }
}

/// How a candidate executable is confirmed to work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyProbe {
    /// The path is a regular file with an execute bit.
    Executable,
    /// Additionally, running the path with these arguments exits 0.
    Run(Vec<String>),
}

impl VerifyProbe {
    /// Probe that runs the executable with `args`.
    pub fn run<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Run(args.into_iter().map(Into::into).collect())
    }

    /// Check `path` against this probe.
    #[must_use]
    pub fn verify(&self, path: &Path) -> bool {
        if !is_executable(path) {
            return false;
        }
        match self {
            Self::Executable => true,
            Self::Run(args) => CommandLine::new(path).args(args).probe(),
        }
    }
}

impl std::fmt::Display for VerifyProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Executable => write!(f, "executable check"),
            Self::Run(args) => write!(f, "run with [{}]", args.join(" ")),
        }
    }
}

/// Whether `path` is a regular file that may be executed.
#[must_use]
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// One installation strategy plus its per-process state.
///
/// `attempt_install` runs at most once for the lifetime of the method, and
/// the resolved path never changes once a verification has succeeded.
#[derive(Debug)]
pub struct InstallMethod {
    source: InstallSource,
    probe: VerifyProbe,
    attempted: Cell<bool>,
    resolved: OnceCell<PathBuf>,
}

impl InstallMethod {
    /// Wrap a source with an explicit verify probe.
    #[must_use]
    pub fn new(source: InstallSource, probe: VerifyProbe) -> Self {
        Self {
            source,
            probe,
            attempted: Cell::new(false),
            resolved: OnceCell::new(),
        }
    }

    /// Conda package method; the probe comes from the package's verify command.
    #[must_use]
    pub fn conda(package: CondaPackage) -> Self {
        let probe = package.verify_probe();
        Self::new(InstallSource::Conda(package), probe)
    }

    /// Preexisting binary method verified by the executable check.
    #[must_use]
    pub fn preexisting(binary: PreexistingBinary) -> Self {
        Self::new(InstallSource::Preexisting(binary), VerifyProbe::Executable)
    }

    /// Download method verified by the executable check.
    #[must_use]
    pub fn download(download: DownloadInstall) -> Self {
        Self::new(InstallSource::Download(download), VerifyProbe::Executable)
    }

    /// Replace the verify probe.
    #[must_use]
    pub fn with_probe(mut self, probe: VerifyProbe) -> Self {
        self.probe = probe;
        self
    }

    /// The installation source.
    #[must_use]
    pub fn source(&self) -> &InstallSource {
        &self.source
    }

    /// The verify probe.
    #[must_use]
    pub fn probe(&self) -> &VerifyProbe {
        &self.probe
    }

    /// Cheap, side-effect-free check that the tool is already in place.
    #[must_use]
    pub fn is_already_installed(&self) -> bool {
        self.resolved.get().is_some() || self.source.is_already_installed()
    }

    /// Perform the installation action.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstallMethodFailure`] when this method was already
    /// attempted in this process, or the source's own error when installing
    /// fails.
    pub fn attempt_install(&self) -> Result<()> {
        if self.attempted.replace(true) {
            return Err(Error::install_method(
                self.source.to_string(),
                "installation was already attempted in this process",
            ));
        }
        info!(method = %self.source, "Attempting install");
        self.source.attempt_install()
    }

    /// The path this method believes is correct.
    ///
    /// Only meaningful after [`is_already_installed`](Self::is_already_installed)
    /// or a successful [`attempt_install`](Self::attempt_install).
    #[must_use]
    pub fn executable_path(&self) -> Option<PathBuf> {
        self.resolved
            .get()
            .cloned()
            .or_else(|| self.source.executable_path())
    }

    /// Install if needed, then verify; returns the verified path.
    ///
    /// # Errors
    ///
    /// Returns an error describing why this candidate cannot be used.
    pub fn provision(&self) -> Result<PathBuf> {
        if let Some(path) = self.resolved.get() {
            return Ok(path.clone());
        }

        if self.source.is_already_installed() {
            debug!(method = %self.source, "Already installed");
        } else {
            self.attempt_install()?;
            if !self.source.is_already_installed() {
                return Err(Error::install_method(
                    self.source.to_string(),
                    "installation finished but the tool is still missing",
                ));
            }
        }

        let path = self.source.executable_path().ok_or_else(|| {
            Error::install_method(self.source.to_string(), "no executable path on this platform")
        })?;

        if !self.probe.verify(&path) {
            return Err(Error::install_method(
                self.source.to_string(),
                format!("{} failed for {}", self.probe, path.display()),
            ));
        }

        debug!(method = %self.source, path = %path.display(), "Verified");
        Ok(self.resolved.get_or_init(|| path).clone())
    }
}

impl std::fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.source.fmt(f)
    }
}
