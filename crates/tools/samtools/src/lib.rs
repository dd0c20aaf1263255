//! samtools wrapper.
//!
//! Provides the handful of SAM/BAM operations other wrappers need: format
//! conversion and filtering (`view`), coordinate sorting, indexing and read
//! counting.

use std::path::{Path, PathBuf};

use tracing::debug;

use toolshed_core::command::IntoArg;
use toolshed_core::config::Settings;
use toolshed_core::tools::{
    CondaPackage, InstallMethod, PreexistingBinary, Tool, ToolHandle, ToolSpec, VerifyProbe,
};
use toolshed_core::{Error, Result};

/// Tool name.
pub const TOOL_NAME: &str = "samtools";

/// Pinned samtools release.
pub const TOOL_VERSION: &str = "1.9";

/// Handle on samtools.
#[derive(Debug)]
pub struct SamtoolsTool {
    handle: ToolHandle,
    temp_dir: PathBuf,
}

impl SamtoolsTool {
    /// samtools from bioconda, falling back to one already on `PATH`.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let conda = CondaPackage::new(TOOL_NAME, settings)
            .version(TOOL_VERSION)
            .verify_args(["--version"]);
        let on_path = InstallMethod::preexisting(PreexistingBinary::on_path(TOOL_NAME))
            .with_probe(VerifyProbe::run(["--version"]));
        Self::from_handle(
            ToolHandle::new(
                ToolSpec::new(TOOL_NAME, TOOL_VERSION),
                vec![InstallMethod::conda(conda), on_path],
            ),
            &settings.temp_dir,
        )
    }

    /// Wrap an existing handle; `temp_dir` holds captured output.
    #[must_use]
    pub fn from_handle(handle: ToolHandle, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            temp_dir: temp_dir.into(),
        }
    }

    /// `samtools view <options> -o <output> <input> [regions...]`.
    ///
    /// # Errors
    ///
    /// Fails when samtools is unavailable or exits unsuccessfully.
    pub fn view<I>(&self, options: I, input: &Path, output: &Path, regions: &[&str]) -> Result<()>
    where
        I: IntoIterator,
        I::Item: IntoArg,
    {
        self.handle
            .command()?
            .arg("view")
            .args(options)
            .arg("-o")
            .arg(output)
            .arg(input)
            .args(regions.iter().copied())
            .run()
    }

    /// `samtools sort -o <output> <input>`.
    ///
    /// # Errors
    ///
    /// Fails when samtools is unavailable or exits unsuccessfully.
    pub fn sort(&self, input: &Path, output: &Path) -> Result<()> {
        self.handle
            .command()?
            .args(["sort", "-o"])
            .arg(output)
            .arg(input)
            .run()
    }

    /// `samtools index <bam> [index]`.
    ///
    /// Without `index`, samtools writes `<bam>.bai`.
    ///
    /// # Errors
    ///
    /// Fails when samtools is unavailable or exits unsuccessfully.
    pub fn index(&self, bam: &Path, index: Option<&Path>) -> Result<()> {
        self.handle
            .command()?
            .arg("index")
            .arg(bam)
            .arg(index)
            .run()
    }

    /// Number of reads in `bam`, from `samtools view -c`.
    ///
    /// # Errors
    ///
    /// Fails when samtools is unavailable, exits unsuccessfully, or prints
    /// something other than a count.
    pub fn count(&self, bam: &Path) -> Result<u64> {
        let captured = tempfile::Builder::new()
            .prefix("samtools-count-")
            .suffix(".txt")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| Error::io(e, Some(self.temp_dir.as_path()), "creating temporary file"))?;

        let cmd = self
            .handle
            .command()?
            .args(["view", "-c"])
            .arg(bam)
            .stdout_to(captured.path());
        cmd.run()?;

        let text = std::fs::read_to_string(captured.path())
            .map_err(|e| Error::io(e, Some(captured.path()), "reading samtools output"))?;
        let count = text
            .trim()
            .parse::<u64>()
            .map_err(|e| Error::unexpected_output(cmd.render(), format!("{e}: {:?}", text.trim())))?;
        debug!(bam = %bam.display(), count, "Counted reads");
        Ok(count)
    }
}

impl Tool for SamtoolsTool {
    fn handle(&self) -> &ToolHandle {
        &self.handle
    }

    fn into_handle(self) -> ToolHandle {
        self.handle
    }
}
