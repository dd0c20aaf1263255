pub mod annex;
pub mod rmdup;
pub mod tool;

use toolshed_annex::GitAnnexTool;
use toolshed_core::config::Settings;
use toolshed_core::tools::{Tool, ToolRegistry};
use toolshed_tools_mvicuna::MvicunaTool;
use toolshed_tools_novoalign::NovoalignTool;
use toolshed_tools_samtools::SamtoolsTool;

/// Every tool toolshed knows how to provision.
pub fn catalogue(settings: &Settings) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(GitAnnexTool::new(settings).into_handle());
    registry.register(MvicunaTool::new(settings).into_handle());
    registry.register(NovoalignTool::new(settings).into_handle());
    registry.register(SamtoolsTool::new(settings).into_handle());
    registry
}
