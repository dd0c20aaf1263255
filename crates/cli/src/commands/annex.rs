use std::path::Path;

use tracing::{Span, info_span, instrument};

use toolshed_annex::{AnnexStore, GitAnnexTool, StoreLayout};
use toolshed_core::config::Settings;

use crate::cli::AnnexCommands;

pub fn store(settings: &Settings, parent: &Span) -> AnnexStore {
    AnnexStore::new(GitAnnexTool::new(settings), StoreLayout::from_settings(settings))
        .with_span(info_span!(parent: parent, "annex"))
}

#[instrument(skip(store))]
pub fn run(store: &AnnexStore, command: AnnexCommands) -> miette::Result<()> {
    match command {
        AnnexCommands::Init { description } => store.annex().init(description.as_deref())?,
        AnnexCommands::Add { path } => store.annex().add(&path)?,
        AnnexCommands::Get { paths } => for_each(&paths, |p| store.get(p))?,
        AnnexCommands::Drop { paths } => for_each(&paths, |p| store.drop(p))?,
        AnnexCommands::Move { path, to } => store.move_to(&path, &to)?,
        AnnexCommands::InitRemote {
            name,
            remote_type,
            attrs,
        } => store.init_remote(&name, &remote_type, attrs)?,
    }
    Ok(())
}

/// Apply `op` to each path, stopping at the first failure.
fn for_each<F>(paths: &[impl AsRef<Path>], op: F) -> toolshed_core::Result<()>
where
    F: Fn(&Path) -> toolshed_core::Result<()>,
{
    paths.iter().try_for_each(|p| op(p.as_ref()))
}
