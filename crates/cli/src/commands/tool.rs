use std::io::Write;
use std::path::PathBuf;

use tracing::instrument;

use toolshed_core::tools::{ToolHandle, ToolRegistry};

use crate::errors::CliError;

fn lookup<'a>(registry: &'a ToolRegistry, name: &str) -> Result<&'a ToolHandle, CliError> {
    registry
        .get(name)
        .ok_or_else(|| CliError::unknown_tool(name, &registry.names()))
}

/// Print every tool with its install methods, in resolution order.
pub fn list(registry: &ToolRegistry, out: &mut impl Write) -> Result<(), CliError> {
    for handle in registry.iter() {
        writeln!(out, "{}", handle.spec())?;
        for method in handle.install_methods() {
            writeln!(out, "  {method}")?;
        }
    }
    Ok(())
}

#[instrument(skip(registry))]
pub fn path(registry: &ToolRegistry, name: &str) -> miette::Result<PathBuf> {
    let handle = lookup(registry, name)?;
    Ok(handle.install_and_get_path()?)
}

#[instrument(skip(registry))]
pub fn exec(registry: &ToolRegistry, name: &str, args: &[String]) -> miette::Result<()> {
    let handle = lookup(registry, name)?;
    handle.execute(args)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolshed_core::tools::{InstallMethod, PreexistingBinary, ToolSpec};

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(ToolHandle::new(
            ToolSpec::new("samtools", "1.9"),
            vec![
                InstallMethod::preexisting(PreexistingBinary::on_path("samtools")),
                InstallMethod::preexisting(PreexistingBinary::new("/opt/samtools")),
            ],
        ));
        registry
    }

    #[test]
    fn test_list_output() {
        let mut out = Vec::new();
        list(&registry(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "samtools 1.9\n  preexisting binary samtools on PATH\n  preexisting binary /opt/samtools\n"
        );
    }

    #[test]
    fn test_unknown_tool() {
        let err = path(&registry(), "bwa").unwrap_err();
        assert!(err.to_string().contains("Unknown tool 'bwa'"));
    }
}
