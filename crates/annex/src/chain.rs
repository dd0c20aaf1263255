//! Following working-tree symlinks to the link that points into the store.

use std::path::{Path, PathBuf};

use toolshed_core::{Error, Result};

use crate::layout::StoreLayout;

/// Upper bound on symlink hops before a chain is treated as a cycle.
pub const MAX_LINK_HOPS: usize = 40;

/// End of a resolved reference chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChain {
    terminal: PathBuf,
    last_target: Option<PathBuf>,
    in_store: bool,
}

impl LinkChain {
    /// The last symlink, whose target is inside the store, or the first
    /// non-symlink reached while following the chain.
    #[must_use]
    pub fn terminal(&self) -> &Path {
        &self.terminal
    }

    /// The raw target of the last symlink followed.
    #[must_use]
    pub fn last_target(&self) -> Option<&Path> {
        self.last_target.as_deref()
    }

    /// Whether the chain ended on a link whose target is inside the store.
    ///
    /// `false` when following stopped at a path that is not a symlink.
    #[must_use]
    pub fn reaches_store(&self) -> bool {
        self.in_store
    }

    /// Whether the terminal's content is present locally.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.terminal.is_file()
    }

    /// Directory the backing tool must run in for this object.
    #[must_use]
    pub fn object_dir(&self) -> &Path {
        match self.terminal.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// File name the backing tool operates on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BrokenReference`] when the terminal has no file name.
    pub fn object_name(&self) -> Result<&std::ffi::OsStr> {
        self.terminal
            .file_name()
            .ok_or_else(|| Error::broken_reference(&self.terminal, "path has no file name"))
    }
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|meta| meta.file_type().is_symlink())
}

/// Follow symlinks from `path` until one points into the store.
///
/// Relative link targets are resolved against the directory of the link that
/// holds them. Following stops early at the first path that is not a symlink.
///
/// # Errors
///
/// Returns [`Error::BrokenReference`] when `path` is not a symlink, or when
/// more than [`MAX_LINK_HOPS`] links are followed.
pub fn resolve_chain(path: &Path, layout: &StoreLayout) -> Result<LinkChain> {
    if !is_symlink(path) {
        return Err(Error::broken_reference(path, "not a symlink"));
    }

    let mut current = path.to_path_buf();
    let mut last_target = None;
    for _ in 0..MAX_LINK_HOPS {
        if !is_symlink(&current) {
            return Ok(LinkChain {
                terminal: current,
                last_target,
                in_store: false,
            });
        }

        let target = std::fs::read_link(&current).map_err(|e| {
            Error::broken_reference(&current, format!("cannot read link: {e}"))
        })?;
        if layout.contains(&target) {
            return Ok(LinkChain {
                terminal: current,
                last_target: Some(target),
                in_store: true,
            });
        }

        current = if target.is_absolute() {
            target.clone()
        } else {
            current
                .parent()
                .map_or_else(|| target.clone(), |dir| dir.join(&target))
        };
        last_target = Some(target);
    }

    Err(Error::broken_reference(
        path,
        format!("no store object within {MAX_LINK_HOPS} symlink hops"),
    ))
}
