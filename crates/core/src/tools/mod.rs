//! Tool provisioning.
//!
//! External executables are described declaratively and resolved lazily:
//!
//! - [`ToolHandle`] - A named tool with an ordered list of install methods
//! - [`InstallMethod`] - One strategy plus its verify probe and per-process state
//! - [`InstallSource`] - The closed set of strategies: [`CondaPackage`],
//!   [`PreexistingBinary`], [`DownloadInstall`]
//! - [`ToolRegistry`] - Name-indexed collection of handles
//! - [`Tool`] - Trait for per-tool wrappers built on a handle
//!
//! # Example
//!
//! ```ignore
//! use toolshed_core::tools::{CondaPackage, InstallMethod, PreexistingBinary, ToolHandle, ToolSpec};
//!
//! let samtools = ToolHandle::new(
//!     ToolSpec::new("samtools", "1.9"),
//!     vec![
//!         InstallMethod::conda(CondaPackage::new("samtools", &settings).version("1.9")),
//!         InstallMethod::preexisting(PreexistingBinary::on_path("samtools")),
//!     ],
//! );
//! samtools.execute(["index", "reads.bam"])?;
//! ```

pub mod conda;
mod download;
mod handle;
mod method;
mod platform;
mod preexisting;
mod registry;

use std::path::PathBuf;

pub use conda::CondaPackage;
pub use download::DownloadInstall;
pub use handle::{ToolHandle, ToolSpec};
pub use method::{InstallMethod, InstallSource, VerifyProbe, is_executable};
pub use platform::{Arch, Os, Platform};
pub use preexisting::PreexistingBinary;
pub use registry::ToolRegistry;

use crate::Result;

/// A wrapper around one external tool.
///
/// Implementors own a [`ToolHandle`] and add tool-specific operations that
/// translate semantic parameters into argument vectors.
pub trait Tool {
    /// The underlying handle.
    fn handle(&self) -> &ToolHandle;

    /// Give up the wrapper and keep only the handle.
    fn into_handle(self) -> ToolHandle
    where
        Self: Sized;

    /// Resolve (and if necessary install) the tool.
    ///
    /// # Errors
    ///
    /// Returns an error when no install method verifies.
    fn install_and_get_path(&self) -> Result<PathBuf> {
        self.handle().install_and_get_path()
    }

    /// Declared version of the tool, if any.
    fn version(&self) -> Option<&str> {
        self.handle().version()
    }
}
