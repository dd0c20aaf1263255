//! User-facing configuration.
//!
//! Settings come from a TOML file with every key optional:
//!
//! ```toml
//! tools_dir = "/opt/toolshed/tools"
//! binaries_dir = "/opt/toolshed/bin"
//! temp_dir = "/scratch/tmp"
//! conda = "mamba"
//! store_objects = ".git/annex/objects"
//! ```
//!
//! Environment variables (`TOOLSHED_TOOLS_DIR`, `TOOLSHED_BINARIES_DIR`,
//! `TOOLSHED_TMPDIR`, `TOOLSHED_CONDA`) override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, Result, paths};

/// Default store object directory, relative to the repository root.
pub const DEFAULT_STORE_OBJECTS: &str = ".git/annex/objects";

/// Raw contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Root for conda environments and downloads.
    pub tools_dir: Option<PathBuf>,
    /// Root for pre-bundled binaries.
    pub binaries_dir: Option<PathBuf>,
    /// Directory for adapter temporaries.
    pub temp_dir: Option<PathBuf>,
    /// Package manager executable.
    pub conda: Option<String>,
    /// Store object directory relative to the repository root.
    pub store_objects: Option<PathBuf>,
}

impl ConfigFile {
    /// Parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, Some(path), "reading config file"))?;
        toml::from_str(&text)
            .map_err(|e| Error::configuration(format!("{}: {e}", path.display())))
    }
}

/// Resolved settings with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root for conda environments and downloads.
    pub tools_dir: PathBuf,
    /// Root for pre-bundled binaries.
    pub binaries_dir: PathBuf,
    /// Directory for adapter temporaries.
    pub temp_dir: PathBuf,
    /// Package manager executable.
    pub conda: String,
    /// Store object directory relative to the repository root.
    pub store_objects: PathBuf,
}

impl Settings {
    /// Settings rooted at `tools_dir`, without consulting files or the environment.
    #[must_use]
    pub fn with_tools_dir(tools_dir: impl Into<PathBuf>) -> Self {
        let tools_dir = tools_dir.into();
        Self {
            binaries_dir: tools_dir.join("bin"),
            tools_dir,
            temp_dir: std::env::temp_dir(),
            conda: default_conda(),
            store_objects: PathBuf::from(DEFAULT_STORE_OBJECTS),
        }
    }

    /// Load settings.
    ///
    /// Resolution order: `explicit` path, `TOOLSHED_CONFIG`, the user config
    /// file if it exists, then built-in defaults. Environment overrides are
    /// applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if a named config file is missing or malformed, or if
    /// no default directory can be determined.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit.map(Path::to_path_buf).or_else(|| env_path("TOOLSHED_CONFIG")) {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                ConfigFile::load(&path)?
            }
            None => {
                let path = paths::config_file()?;
                if path.is_file() {
                    debug!(path = %path.display(), "Loading user config file");
                    ConfigFile::load(&path)?
                } else {
                    ConfigFile::default()
                }
            }
        };
        Self::from_file(file)
    }

    /// Fill in defaults for a parsed file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if no default tools directory can be determined.
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let tools_dir = match env_path("TOOLSHED_TOOLS_DIR").or(file.tools_dir) {
            Some(dir) => dir,
            None => paths::tools_dir()?,
        };
        let mut settings = Self::with_tools_dir(tools_dir);
        if let Some(dir) = env_path("TOOLSHED_BINARIES_DIR").or(file.binaries_dir) {
            settings.binaries_dir = dir;
        }
        if let Some(dir) = env_path("TOOLSHED_TMPDIR").or(file.temp_dir) {
            settings.temp_dir = dir;
        }
        if let Some(conda) = env_string("TOOLSHED_CONDA").or(file.conda) {
            settings.conda = conda;
        }
        if let Some(objects) = file.store_objects {
            if objects.is_absolute() {
                return Err(Error::configuration(format!(
                    "store_objects must be relative to the repository root, got {}",
                    objects.display()
                )));
            }
            settings.store_objects = objects;
        }
        Ok(settings)
    }

    /// Directory holding named conda environments.
    #[must_use]
    pub fn conda_envs_dir(&self) -> PathBuf {
        self.tools_dir.join("conda-envs")
    }

    /// Directory holding downloaded tools.
    #[must_use]
    pub fn downloads_dir(&self) -> PathBuf {
        self.tools_dir.join("downloads")
    }
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn env_path(var: &str) -> Option<PathBuf> {
    env_string(var).map(PathBuf::from)
}

/// Pick `mamba` when it is on PATH, then `conda`.
fn default_conda() -> String {
    ["mamba", "conda"]
        .into_iter()
        .find(|exe| which::which(exe).is_ok())
        .unwrap_or("conda")
        .to_string()
}
