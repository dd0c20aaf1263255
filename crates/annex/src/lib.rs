//! git-annex backed working trees.
//!
//! Annexed files are symlinks into a content-addressed object directory. The
//! content may or may not be present locally; [`AnnexStore`] makes it present
//! (`get`) or frees it (`drop`) while leaving the symlinks alone, and
//! forwards remote configuration and transfers to git-annex.

mod chain;
mod layout;
mod store;
mod tool;

pub use chain::{LinkChain, MAX_LINK_HOPS, resolve_chain};
pub use layout::StoreLayout;
pub use store::AnnexStore;
pub use tool::{GitAnnexTool, TOOL_NAME, TOOL_VERSION};
