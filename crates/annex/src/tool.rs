//! The git-annex executable and its repository-level operations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use toolshed_core::Result;
use toolshed_core::command::{CommandLine, IntoArg};
use toolshed_core::config::Settings;
use toolshed_core::tools::{
    CondaPackage, InstallMethod, PreexistingBinary, Tool, ToolHandle, ToolSpec, VerifyProbe,
};

/// Tool name.
pub const TOOL_NAME: &str = "git-annex";

/// Pinned git-annex release.
pub const TOOL_VERSION: &str = "7.20181105";

/// Handle on git-annex plus the commands toolshed uses.
///
/// Repository-level commands run in [`work_tree`](Self::in_work_tree) when
/// one is set, otherwise in the current directory of the process.
#[derive(Debug)]
pub struct GitAnnexTool {
    handle: ToolHandle,
    work_tree: Option<PathBuf>,
}

impl GitAnnexTool {
    /// git-annex from conda-forge, falling back to one already on `PATH`.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let conda = CondaPackage::new(TOOL_NAME, settings)
            .version(TOOL_VERSION)
            .channel("conda-forge")
            .verify_args(["version"]);
        let on_path = InstallMethod::preexisting(PreexistingBinary::on_path(TOOL_NAME))
            .with_probe(VerifyProbe::run(["version"]));
        Self::from_handle(ToolHandle::new(
            ToolSpec::new(TOOL_NAME, TOOL_VERSION),
            vec![InstallMethod::conda(conda), on_path],
        ))
    }

    /// Wrap an existing handle.
    #[must_use]
    pub fn from_handle(handle: ToolHandle) -> Self {
        Self {
            handle,
            work_tree: None,
        }
    }

    /// Run repository-level commands in `dir`.
    ///
    /// Relative paths given to [`add`](Self::add) and
    /// [`move_to`](Self::move_to) are then resolved by git-annex against
    /// `dir`, not against the current directory of this process. Pass
    /// absolute paths to refer to files from elsewhere.
    #[must_use]
    pub fn in_work_tree(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_tree = Some(dir.into());
        self
    }

    /// The working tree repository commands run in, if pinned.
    #[must_use]
    pub fn work_tree(&self) -> Option<&Path> {
        self.work_tree.as_deref()
    }

    fn command<I>(&self, args: I) -> Result<CommandLine>
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        let mut cmd = self.handle.command()?.args(args);
        if let Some(dir) = &self.work_tree {
            cmd = cmd.current_dir(dir);
        }
        Ok(cmd)
    }

    /// `git-annex init [description]`.
    ///
    /// # Errors
    ///
    /// Fails when git-annex is unavailable or exits unsuccessfully.
    pub fn init(&self, description: Option<&str>) -> Result<()> {
        self.command([Some("init"), description])?.run()
    }

    /// `git-annex add <path>`.
    ///
    /// A relative `path` is taken relative to the pinned work tree.
    ///
    /// # Errors
    ///
    /// Fails when git-annex is unavailable or exits unsuccessfully.
    pub fn add(&self, path: &Path) -> Result<()> {
        self.command(["add"])?.arg(path).run()
    }

    /// `git-annex initremote <name> type=<type> key=value...`.
    ///
    /// `encryption=none` is passed unless `attrs` sets `encryption`.
    /// Attributes are passed in key order.
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
        let mut attrs: BTreeMap<String, String> = attrs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        attrs
            .entry("encryption".to_string())
            .or_insert_with(|| "none".to_string());

        let pairs = attrs.iter().map(|(k, v)| format!("{k}={v}"));
        self.command(["initremote", name])?
            .arg(format!("type={remote_type}"))
            .args(pairs)
            .run()
    }

    /// `git-annex move <path> --to <remote>`.
    ///
    /// A relative `path` is taken relative to the pinned work tree.
    ///
    /// # Errors
    ///
    /// Fails when git-annex is unavailable or exits unsuccessfully.
    pub fn move_to(&self, path: &Path, remote: &str) -> Result<()> {
        self.command(["move"])?.arg(path).args(["--to", remote]).run()
    }

    /// Run `git-annex <op> <name>` inside `dir`, ignoring the work tree.
    pub(crate) fn run_in(&self, dir: &Path, op: &str, name: &std::ffi::OsStr) -> Result<()> {
        self.handle.command()?.current_dir(dir).arg(op).arg(name).run()
    }
}

impl Tool for GitAnnexTool {
    fn handle(&self) -> &ToolHandle {
        &self.handle
    }

    fn into_handle(self) -> ToolHandle {
        self.handle
    }
}
