//! Where the object store lives inside a working tree.

use std::path::{Component, Path, PathBuf};

use toolshed_core::config::{DEFAULT_STORE_OBJECTS, Settings};

/// The object directory of a store, as a relative path.
///
/// A link target lies inside the store when this path appears in it as a
/// contiguous run of components. Matching is by component, so
/// `.git/annex/objects` matches `../../.git/annex/objects/Xk/3v/KEY/KEY` but
/// not `my.git/annex/objectsX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    objects: PathBuf,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_OBJECTS)
    }
}

impl StoreLayout {
    /// Layout with the given objects directory.
    #[must_use]
    pub fn new(objects: impl Into<PathBuf>) -> Self {
        Self {
            objects: objects.into(),
        }
    }

    /// Layout taken from configuration.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.store_objects)
    }

    /// The objects directory.
    #[must_use]
    pub fn objects(&self) -> &Path {
        &self.objects
    }

    /// Whether `target` points into the object directory.
    #[must_use]
    pub fn contains(&self, target: &Path) -> bool {
        let marker = normal_components(&self.objects);
        if marker.is_empty() {
            return false;
        }
        let target = normal_components(target);
        target.windows(marker.len()).any(|window| window == marker.as_slice())
    }
}

/// Named components only; `..`, `.` and roots never take part in a match.
fn normal_components(path: &Path) -> Vec<&std::ffi::OsStr> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect()
}
