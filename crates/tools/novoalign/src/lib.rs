//! Novoalign wrapper.
//!
//! Aligns reads against a reference indexed with `novoindex`, producing a
//! coordinate-sorted, indexed BAM. Novoalign writes SAM to stdout, so the
//! wrapper captures it in a scratch directory and converts it with samtools.

use std::path::{Path, PathBuf};

use tracing::info;

use toolshed_core::command::CommandLine;
use toolshed_core::config::Settings;
use toolshed_core::tools::{CondaPackage, InstallMethod, Tool, ToolHandle, ToolSpec};
use toolshed_core::{Error, Result};
use toolshed_tools_samtools::SamtoolsTool;

/// Tool name.
pub const TOOL_NAME: &str = "novoalign";

/// Pinned Novoalign release.
pub const TOOL_VERSION: &str = "3.07.00";

/// Options for [`NovoalignTool::align`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignOptions {
    /// Extra novoalign arguments.
    pub options: Vec<String>,
    /// Drop alignments with a mapping quality below this.
    pub min_qual: Option<u8>,
    /// Input format passed to `-F`.
    pub input_format: String,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            options: vec!["-r".into(), "Random".into()],
            min_qual: None,
            input_format: "BAMPE".into(),
        }
    }
}

/// Index file novoindex produces for `fasta`: the extension becomes `.nix`.
#[must_use]
pub fn index_path(fasta: &Path) -> PathBuf {
    fasta.with_extension("nix")
}

/// Index file written next to an aligned BAM: `out.bam` gets `out.bai`.
#[must_use]
pub fn bam_index_path(bam: &Path) -> PathBuf {
    bam.with_extension("bai")
}

/// Handle on novoalign, with samtools for post-processing.
#[derive(Debug)]
pub struct NovoalignTool {
    handle: ToolHandle,
    samtools: SamtoolsTool,
    temp_dir: PathBuf,
}

impl NovoalignTool {
    /// novoalign from bioconda; `novoindex` ships in the same environment.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let conda = CondaPackage::new(TOOL_NAME, settings).version(TOOL_VERSION);
        Self::from_parts(
            ToolHandle::new(
                ToolSpec::new(TOOL_NAME, TOOL_VERSION),
                vec![InstallMethod::conda(conda)],
            ),
            SamtoolsTool::new(settings),
            &settings.temp_dir,
        )
    }

    /// Assemble from existing handles.
    #[must_use]
    pub fn from_parts(handle: ToolHandle, samtools: SamtoolsTool, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            samtools,
            temp_dir: temp_dir.into(),
        }
    }

    /// The samtools used for post-processing.
    #[must_use]
    pub fn samtools(&self) -> &SamtoolsTool {
        &self.samtools
    }

    /// Build the novoalign index for `fasta`, written to [`index_path`].
    ///
    /// # Errors
    ///
    /// Fails when novoalign is unavailable or novoindex exits unsuccessfully.
    pub fn index_fasta(&self, fasta: &Path) -> Result<PathBuf> {
        let novoalign = self.handle.install_and_get_path()?;
        let index = index_path(fasta);
        CommandLine::new(novoalign.with_file_name("novoindex"))
            .with_span(self.handle.span().clone())
            .arg(&index)
            .arg(fasta)
            .run()?;
        Ok(index)
    }

    /// Align `reads` to `reference`, writing a sorted BAM to `out_bam` and
    /// its index to [`bam_index_path`].
    ///
    /// The reference is indexed first when its `.nix` file is missing.
    ///
    /// # Errors
    ///
    /// Fails when novoalign or samtools is unavailable or exits
    /// unsuccessfully, or when scratch files cannot be created.
    pub fn align(&self, reads: &Path, reference: &Path, out_bam: &Path, opts: &AlignOptions) -> Result<()> {
        let index = index_path(reference);
        if !index.is_file() {
            info!(reference = %reference.display(), "Reference is not indexed yet");
            self.index_fasta(reference)?;
        }

        let scratch = tempfile::Builder::new()
            .prefix("novoalign-")
            .tempdir_in(&self.temp_dir)
            .map_err(|e| Error::io(e, Some(self.temp_dir.as_path()), "creating scratch directory"))?;
        let sam = scratch.path().join("aligned.sam");
        let unsorted = scratch.path().join("aligned.bam");

        self.handle
            .command()?
            .arg("-f")
            .arg(reads)
            .args(["-F", opts.input_format.as_str(), "-d"])
            .arg(&index)
            .args(["-o", "SAM"])
            .args(&opts.options)
            .stdout_to(&sam)
            .run()?;

        let min_qual = opts.min_qual.map(|q| q.to_string());
        let filter = min_qual.as_deref().map(|q| ["-q", q]);
        self.samtools.view(
            ["-b", "-S"].into_iter().chain(filter.into_iter().flatten()),
            &sam,
            &unsorted,
            &[],
        )?;
        self.samtools.sort(&unsorted, out_bam)?;
        self.samtools.index(out_bam, Some(bam_index_path(out_bam).as_path()))?;

        info!(reads = %reads.display(), out = %out_bam.display(), "Aligned reads");
        Ok(())
    }
}

impl Tool for NovoalignTool {
    fn handle(&self) -> &ToolHandle {
        &self.handle
    }

    fn into_handle(self) -> ToolHandle {
        self.handle
    }
}
