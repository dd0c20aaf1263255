//! M-Vicuna wrapper: duplicate removal for paired-end FASTQ.
//!
//! `mvicuna -tasks DupRm` writes its pairs under the `-drm_op` names and then
//! renames them to the `-opfq` names. A rename cannot cross filesystems, so
//! both sets of names live in one scratch directory and the results are
//! copied to the requested outputs afterwards.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use toolshed_core::config::Settings;
use toolshed_core::tools::{
    CondaPackage, InstallMethod, Os, Platform, PreexistingBinary, Tool, ToolHandle, ToolSpec,
};
use toolshed_core::{Error, Result};

/// Tool name.
pub const TOOL_NAME: &str = "mvicuna";

/// Pinned M-Vicuna release.
pub const TOOL_VERSION: &str = "1.0";

/// Two paths, one per mate.
pub type Pair<'a> = (&'a Path, &'a Path);

/// Path of the bundled binary for `platform` under `binaries_dir`.
#[must_use]
pub fn bundled_path(binaries_dir: &Path, platform: Option<Platform>) -> Option<PathBuf> {
    let os_dir = match platform?.os {
        Os::Darwin => "MacOSX",
        Os::Linux => "linux64",
    };
    Some(binaries_dir.join(TOOL_NAME).join(os_dir).join(TOOL_NAME))
}

/// Handle on M-Vicuna.
#[derive(Debug)]
pub struct MvicunaTool {
    handle: ToolHandle,
    temp_dir: PathBuf,
}

impl MvicunaTool {
    /// The bioconda package, then the binary bundled for this platform.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let conda = CondaPackage::new(TOOL_NAME, settings).version(TOOL_VERSION);
        let bundled = bundled_path(&settings.binaries_dir, Platform::current());
        if bundled.is_none() {
            debug!("No bundled mvicuna for this platform");
        }
        Self::from_handle(
            ToolHandle::new(
                ToolSpec::new(TOOL_NAME, TOOL_VERSION),
                vec![
                    InstallMethod::conda(conda),
                    InstallMethod::preexisting(PreexistingBinary::from_option(bundled)),
                ],
            ),
            &settings.temp_dir,
        )
    }

    /// Wrap an existing handle; scratch files go under `temp_dir`.
    #[must_use]
    pub fn from_handle(handle: ToolHandle, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            temp_dir: temp_dir.into(),
        }
    }

    /// Remove duplicate read pairs from `input`, writing `output`.
    ///
    /// Reads whose mate was lost go to `unpaired`, or are discarded when it
    /// is `None`.
    ///
    /// # Errors
    ///
    /// Fails when mvicuna is unavailable or exits unsuccessfully, or when the
    /// scratch directory or the outputs cannot be written.
    pub fn rmdup(&self, input: Pair<'_>, output: Pair<'_>, unpaired: Option<&Path>) -> Result<()> {
        let scratch = tempfile::Builder::new()
            .prefix("mvicuna-")
            .tempdir_in(&self.temp_dir)
            .map_err(|e| Error::io(e, Some(self.temp_dir.as_path()), "creating scratch directory"))?;
        let dir = scratch.path();

        let renamed = (dir.join("tmp2out.1.fastq"), dir.join("tmp2out.2.fastq"));
        let written = (dir.join("tmp1out.1.fastq"), dir.join("tmp1out.2.fastq"));
        let unpaired = unpaired.map_or_else(|| dir.join("unpaired.fastq"), Path::to_path_buf);

        self.handle
            .command()?
            .arg("-ipfq")
            .arg(join_pair(input.0, input.1))
            .arg("-opfq")
            .arg(join_pair(&renamed.0, &renamed.1))
            .arg("-osfq")
            .arg(&unpaired)
            .arg("-drm_op")
            .arg(join_pair(&written.0, &written.1))
            .args(["-tasks", "DupRm"])
            .run()?;

        for (from, to) in [(&renamed.0, output.0), (&renamed.1, output.1)] {
            std::fs::copy(from, to)
                .map_err(|e| Error::io(e, Some(to), "copying deduplicated reads"))?;
        }
        info!(
            out1 = %output.0.display(),
            out2 = %output.1.display(),
            "Removed duplicate pairs"
        );
        Ok(())
    }
}

fn join_pair(first: &Path, second: &Path) -> std::ffi::OsString {
    let mut joined = first.as_os_str().to_os_string();
    joined.push(",");
    joined.push(second);
    joined
}

impl Tool for MvicunaTool {
    fn handle(&self) -> &ToolHandle {
        &self.handle
    }

    fn into_handle(self) -> ToolHandle {
        self.handle
    }
}
