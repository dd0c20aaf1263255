//! CLI-specific errors.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Unknown tool '{name}'")]
    #[diagnostic(
        code(toolshed::cli::unknown_tool),
        help("Known tools: {known}. Run 'toolshed tool list' for details")
    )]
    UnknownTool { name: String, known: String },

    #[error("Failed to write output")]
    #[diagnostic(code(toolshed::cli::output))]
    Output {
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn unknown_tool(name: impl Into<String>, known: &[&str]) -> Self {
        Self::UnknownTool {
            name: name.into(),
            known: known.join(", "),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(source: std::io::Error) -> Self {
        Self::Output { source }
    }
}
