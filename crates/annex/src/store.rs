//! Materializing and freeing annexed working-tree files.

use std::path::Path;

use tracing::{Span, debug, info, info_span};

use toolshed_core::{Error, Result};

use crate::chain::{LinkChain, resolve_chain};
use crate::layout::StoreLayout;
use crate::tool::GitAnnexTool;

/// A git-annex object store seen through working-tree symlinks.
///
/// `get` and `drop` only change whether an object's content is present
/// locally; the caller's symlink is never touched.
#[derive(Debug)]
pub struct AnnexStore {
    annex: GitAnnexTool,
    layout: StoreLayout,
    span: Span,
}

impl AnnexStore {
    /// Store using `annex` for transfers and `layout` to recognise objects.
    #[must_use]
    pub fn new(annex: GitAnnexTool, layout: StoreLayout) -> Self {
        Self {
            annex,
            layout,
            span: info_span!("annex"),
        }
    }

    /// Emit log events under `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The git-annex tool.
    #[must_use]
    pub fn annex(&self) -> &GitAnnexTool {
        &self.annex
    }

    /// The store layout.
    #[must_use]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Resolve `path` to the link that points into the store.
    ///
    /// # Errors
    ///
    /// See [`resolve_chain`].
    pub fn resolve(&self, path: &Path) -> Result<LinkChain> {
        resolve_chain(path, &self.layout)
    }

    /// Make the content behind `path` present locally.
    ///
    /// Does nothing when it already is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BrokenReference`] when `path` is not a symlink, when
    /// its chain ends on a missing path outside the store, or when the
    /// content is still absent after git-annex succeeded; otherwise
    /// the error from running git-annex.
    pub fn get(&self, path: &Path) -> Result<()> {
        let _entered = self.span.enter();
        let chain = self.resolve(path)?;
        ensure_reaches_store(path, &chain)?;
        if chain.is_materialized() {
            debug!(path = %path.display(), "Already present");
            return Ok(());
        }

        info!(path = %path.display(), object = %chain.terminal().display(), "Fetching content");
        self.annex
            .run_in(chain.object_dir(), "get", chain.object_name()?)?;

        if !chain.is_materialized() {
            return Err(Error::broken_reference(
                path,
                "content is still absent after git-annex get",
            ));
        }
        Ok(())
    }

    /// Remove the local content behind `path`, keeping the symlink.
    ///
    /// Does nothing when the content is already absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BrokenReference`] when `path` is not a symlink, when
    /// its chain ends on a missing path outside the store, or when git-annex
    /// succeeded but the content or the link is not in the
    /// expected state afterwards; otherwise the error from running git-annex.
    pub fn drop(&self, path: &Path) -> Result<()> {
        let _entered = self.span.enter();
        let chain = self.resolve(path)?;
        ensure_reaches_store(path, &chain)?;
        if !chain.is_materialized() {
            debug!(path = %path.display(), "Already absent");
            return Ok(());
        }

        info!(path = %path.display(), object = %chain.terminal().display(), "Dropping content");
        self.annex
            .run_in(chain.object_dir(), "drop", chain.object_name()?)?;

        let still_linked = path
            .symlink_metadata()
            .is_ok_and(|meta| meta.file_type().is_symlink());
        if !still_linked {
            return Err(Error::broken_reference(path, "no longer a symlink after git-annex drop"));
        }
        if chain.is_materialized() {
            return Err(Error::broken_reference(
                path,
                "content is still present after git-annex drop",
            ));
        }
        Ok(())
    }

    /// Send the content of `path` to `remote`, dropping the local copy.
    ///
    /// # Errors
    ///
    /// Fails when git-annex is unavailable or exits unsuccessfully.
    pub fn move_to(&self, path: &Path, remote: &str) -> Result<()> {
        let _entered = self.span.enter();
        info!(path = %path.display(), remote, "Moving content");
        self.annex.move_to(path, remote)
    }

    /// Configure a special remote; see [`GitAnnexTool::init_remote`].
    ///
    /// # Errors
    ///
    /// Fails when git-annex is unavailable or exits unsuccessfully.
    pub fn init_remote<I, K, V>(&self, name: &str, remote_type: &str, attrs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let _entered = self.span.enter();
        info!(remote = name, remote_type, "Initialising remote");
        self.annex.init_remote(name, remote_type, attrs)
    }
}

/// A chain that stopped outside the store must at least end on real content.
fn ensure_reaches_store(path: &Path, chain: &LinkChain) -> Result<()> {
    if chain.reaches_store() || chain.is_materialized() {
        return Ok(());
    }
    Err(Error::broken_reference(
        path,
        format!("chain ends outside the store at {}", chain.terminal().display()),
    ))
}
