mod cli;
mod commands;
mod errors;
mod tracing;

use std::io::Write;

use ::tracing::debug;
use toolshed_core::config::Settings;

use crate::cli::{Commands, ToolCommands};
use crate::errors::CliError;
use crate::tracing::{TracingConfig, command_span};

fn main() -> miette::Result<()> {
    let cli = cli::parse();

    crate::tracing::init_tracing(TracingConfig {
        format: cli.log_format(),
        level: cli.level.into(),
        filter: cli.log_filter.clone(),
    })?;

    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "Loaded settings");

    execute_command(cli.command, &settings)
}

fn execute_command(command: Commands, settings: &Settings) -> miette::Result<()> {
    match command {
        Commands::Tool { subcommand } => {
            let span = command_span("tool");
            let _entered = span.enter();
            let registry = commands::catalogue(settings);
            match subcommand {
                ToolCommands::List => {
                    let mut stdout = std::io::stdout().lock();
                    commands::tool::list(&registry, &mut stdout)?;
                }
                ToolCommands::Path { name } => {
                    let path = commands::tool::path(&registry, &name)?;
                    writeln!(std::io::stdout(), "{}", path.display()).map_err(CliError::from)?;
                }
                ToolCommands::Exec { name, args } => {
                    commands::tool::exec(&registry, &name, &args)?;
                }
            }
        }
        Commands::Annex { subcommand } => {
            let span = command_span("annex");
            let store = commands::annex::store(settings, &span);
            let _entered = span.enter();
            commands::annex::run(&store, subcommand)?;
        }
        Commands::Rmdup(args) => {
            let span = command_span("rmdup");
            let _entered = span.enter();
            commands::rmdup::run(settings, &args)?;
        }
    }
    Ok(())
}
