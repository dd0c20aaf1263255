use tracing::instrument;

use toolshed_core::config::Settings;
use toolshed_tools_mvicuna::MvicunaTool;

use crate::cli::RmdupArgs;

#[instrument(skip(settings))]
pub fn run(settings: &Settings, args: &RmdupArgs) -> miette::Result<()> {
    let mvicuna = MvicunaTool::new(settings);
    mvicuna.rmdup(
        (args.in1.as_path(), args.in2.as_path()),
        (args.out1.as_path(), args.out2.as_path()),
        args.unpaired.as_deref(),
    )?;
    Ok(())
}
