//! Lazily provisioned, memoized handle on one external tool.

use std::cell::OnceCell;
use std::path::PathBuf;

use tracing::{Span, debug, info, info_span, warn};

use super::method::InstallMethod;
use crate::command::{CommandLine, IntoArg};
use crate::{Error, Result};

/// Logical identity of a tool, independent of how it gets installed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolSpec {
    /// Tool name (e.g. "git-annex").
    pub name: String,
    /// Declared version, if the tool pins one.
    pub version: Option<String>,
}

impl ToolSpec {
    /// Tool with a pinned version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }

    /// Tool without a pinned version.
    #[must_use]
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }
}

impl std::fmt::Display for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A named tool with an ordered list of install methods.
///
/// The first method that installs and verifies wins; its path is cached for
/// the lifetime of the handle. The cache is not synchronized, so handles are
/// deliberately `!Sync`: give each thread its own handle.
#[derive(Debug)]
pub struct ToolHandle {
    spec: ToolSpec,
    methods: Vec<InstallMethod>,
    cached: OnceCell<PathBuf>,
    span: Span,
}

impl ToolHandle {
    /// Declare a tool. Nothing is checked or installed until first use.
    #[must_use]
    pub fn new(spec: ToolSpec, methods: Vec<InstallMethod>) -> Self {
        let span = info_span!("tool", name = %spec.name);
        Self {
            spec,
            methods,
            cached: OnceCell::new(),
            span,
        }
    }

    /// Emit this tool's log events under `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The tool's identity.
    #[must_use]
    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    /// Tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Declared version, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.spec.version.as_deref()
    }

    /// The install methods, in the order they are tried.
    #[must_use]
    pub fn install_methods(&self) -> &[InstallMethod] {
        &self.methods
    }

    /// The span this tool logs under.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// The resolved path, if resolution already happened.
    #[must_use]
    pub fn cached_path(&self) -> Option<&PathBuf> {
        self.cached.get()
    }

    /// Resolve the tool to a verified executable, installing it if needed.
    ///
    /// The result is memoized: later calls return the same path without
    /// touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolUnavailable`] listing every attempted method when
    /// none of them yields a verified executable.
    pub fn install_and_get_path(&self) -> Result<PathBuf> {
        if let Some(path) = self.cached.get() {
            return Ok(path.clone());
        }

        let _entered = self.span.enter();
        let mut attempts = Vec::with_capacity(self.methods.len());
        for method in &self.methods {
            match method.provision() {
                Ok(path) => {
                    info!(tool = %self.spec, method = %method, path = %path.display(), "Resolved tool");
                    return Ok(self.cached.get_or_init(|| path).clone());
                }
                Err(e) => {
                    debug!(tool = %self.spec, method = %method, error = %e, "Install method failed");
                    attempts.push(format!("{method}: {e}"));
                }
            }
        }

        warn!(tool = %self.spec, attempted = attempts.len(), "No install method succeeded");
        Err(Error::tool_unavailable(self.spec.to_string(), attempts))
    }

    /// Alias of [`install_and_get_path`](Self::install_and_get_path).
    ///
    /// # Errors
    ///
    /// See [`install_and_get_path`](Self::install_and_get_path).
    pub fn install(&self) -> Result<PathBuf> {
        self.install_and_get_path()
    }

    /// A command line for the resolved executable, with no arguments yet.
    ///
    /// # Errors
    ///
    /// Fails like [`install_and_get_path`](Self::install_and_get_path).
    pub fn command(&self) -> Result<CommandLine> {
        let path = self.install_and_get_path()?;
        Ok(CommandLine::new(path).with_span(self.span.clone()))
    }

    /// Run the tool with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolUnavailable`] if the tool cannot be resolved (the
    /// tool is then never run), or the process error from
    /// [`CommandLine::run`].
    pub fn execute<I>(&self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.command()?.args(args).run()
    }
}
