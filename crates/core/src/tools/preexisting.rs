//! Binaries that are already present and cannot be installed.

use std::path::PathBuf;

use super::method::is_executable;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Fixed(PathBuf),
    OnPath(String),
    Missing,
}

/// A binary at a fixed path, or found on `PATH`.
///
/// Installing is a no-op: either the binary is there or this method fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreexistingBinary {
    location: Location,
}

impl PreexistingBinary {
    /// Binary at a fixed filesystem path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Fixed(path.into()),
        }
    }

    /// Binary looked up by name on `PATH` when checked.
    #[must_use]
    pub fn on_path(name: impl Into<String>) -> Self {
        Self {
            location: Location::OnPath(name.into()),
        }
    }

    /// Fixed path when known; a method that never succeeds otherwise.
    ///
    /// Used for bundled binaries that only exist on some platforms.
    #[must_use]
    pub fn from_option(path: Option<PathBuf>) -> Self {
        Self {
            location: path.map_or(Location::Missing, Location::Fixed),
        }
    }

    pub(crate) fn is_already_installed(&self) -> bool {
        self.executable_path().is_some_and(|p| is_executable(&p))
    }

    pub(crate) fn executable_path(&self) -> Option<PathBuf> {
        match &self.location {
            Location::Fixed(path) => Some(path.clone()),
            Location::OnPath(name) => which::which(name).ok(),
            Location::Missing => None,
        }
    }
}

impl std::fmt::Display for PreexistingBinary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Location::Fixed(path) => write!(f, "{}", path.display()),
            Location::OnPath(name) => write!(f, "{name} on PATH"),
            Location::Missing => write!(f, "(not bundled for this platform)"),
        }
    }
}
