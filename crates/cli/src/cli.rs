use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::tracing::{LogLevel, TracingFormat};

#[derive(Parser, Debug)]
#[command(name = "toolshed")]
#[command(about = "Provision external tools and manage git-annex backed files")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub format: TracingFormat,

    #[arg(long, global = true, help = "Output logs in JSON format (same as --format json)")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        help = "Log filter directives, e.g. toolshed_core=debug (overrides --level and RUST_LOG)"
    )]
    pub log_filter: Option<String>,

    #[arg(
        long,
        global = true,
        env = "TOOLSHED_CONFIG",
        help = "Path to a configuration file"
    )]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Log format after applying the `--json` shorthand.
    pub fn log_format(&self) -> TracingFormat {
        if self.json {
            TracingFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Inspect, provision and run managed tools")]
    Tool {
        #[command(subcommand)]
        subcommand: ToolCommands,
    },
    #[command(about = "Operate on git-annex backed working trees")]
    Annex {
        #[command(subcommand)]
        subcommand: AnnexCommands,
    },
    #[command(about = "Remove duplicate read pairs with M-Vicuna")]
    Rmdup(RmdupArgs),
}

#[derive(Subcommand, Debug)]
pub enum ToolCommands {
    #[command(about = "List known tools and their install methods")]
    List,
    #[command(about = "Provision a tool if needed and print its path")]
    Path {
        #[arg(help = "Tool name")]
        name: String,
    },
    #[command(about = "Provision a tool if needed and run it")]
    Exec {
        #[arg(help = "Tool name")]
        name: String,
        #[arg(last = true, help = "Arguments passed to the tool")]
        args: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AnnexCommands {
    #[command(about = "Initialise git-annex in the current repository")]
    Init {
        #[arg(help = "Description of this repository")]
        description: Option<String>,
    },
    #[command(about = "Add a file to the annex")]
    Add {
        #[arg(help = "File to add")]
        path: PathBuf,
    },
    #[command(about = "Make annexed content present locally")]
    Get {
        #[arg(required = true, help = "Annexed files (symlinks)")]
        paths: Vec<PathBuf>,
    },
    #[command(about = "Remove local annexed content, keeping the symlinks")]
    Drop {
        #[arg(required = true, help = "Annexed files (symlinks)")]
        paths: Vec<PathBuf>,
    },
    #[command(about = "Move annexed content to a remote")]
    Move {
        #[arg(help = "Annexed file")]
        path: PathBuf,
        #[arg(long, help = "Name of the remote")]
        to: String,
    },
    #[command(name = "initremote", about = "Configure a special remote")]
    InitRemote {
        #[arg(help = "Remote name")]
        name: String,
        #[arg(help = "Remote type, e.g. directory or S3")]
        remote_type: String,
        #[arg(value_parser = parse_key_val, help = "Remote attributes as key=value")]
        attrs: Vec<(String, String)>,
    },
}

#[derive(Args, Debug)]
pub struct RmdupArgs {
    #[arg(help = "First input mate (FASTQ)")]
    pub in1: PathBuf,
    #[arg(help = "Second input mate (FASTQ)")]
    pub in2: PathBuf,
    #[arg(help = "First output mate")]
    pub out1: PathBuf,
    #[arg(help = "Second output mate")]
    pub out2: PathBuf,
    #[arg(long, help = "Write reads that lost their mate here")]
    pub unpaired: Option<PathBuf>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["toolshed", "tool", "list"]).unwrap();

        assert_eq!(cli.level, LogLevel::Warn);
        assert!(!cli.json);
        assert_eq!(cli.log_format(), TracingFormat::Compact);
        assert!(cli.log_filter.is_none());
        assert!(matches!(
            cli.command,
            Commands::Tool {
                subcommand: ToolCommands::List
            }
        ));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "toolshed", "tool", "list", "--level", "debug", "--json", "--config", "/etc/t.toml",
        ])
        .unwrap();
        assert_eq!(cli.level, LogLevel::Debug);
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/t.toml")));
    }

    #[test]
    fn test_log_format_selection() {
        let cli = Cli::try_parse_from(["toolshed", "--format", "dev", "tool", "list"]).unwrap();
        assert_eq!(cli.log_format(), TracingFormat::Dev);

        let cli = Cli::try_parse_from(["toolshed", "tool", "list", "--format", "pretty"]).unwrap();
        assert_eq!(cli.log_format(), TracingFormat::Pretty);

        let cli = Cli::try_parse_from(["toolshed", "--format", "pretty", "--json", "tool", "list"])
            .unwrap();
        assert_eq!(cli.log_format(), TracingFormat::Json);

        assert!(Cli::try_parse_from(["toolshed", "--format", "fancy", "tool", "list"]).is_err());
    }

    #[test]
    fn test_log_filter_flag() {
        let cli = Cli::try_parse_from([
            "toolshed",
            "--log-filter",
            "toolshed_annex=trace",
            "annex",
            "get",
            "a.bam",
        ])
        .unwrap();
        assert_eq!(cli.log_filter.as_deref(), Some("toolshed_annex=trace"));
    }

    #[test]
    fn test_tool_exec_passes_trailing_args() {
        let cli =
            Cli::try_parse_from(["toolshed", "tool", "exec", "samtools", "--", "view", "-c", "x.bam"])
                .unwrap();
        match cli.command {
            Commands::Tool {
                subcommand: ToolCommands::Exec { name, args },
            } => {
                assert_eq!(name, "samtools");
                assert_eq!(args, vec!["view", "-c", "x.bam"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_annex_initremote_attrs() {
        let cli = Cli::try_parse_from([
            "toolshed", "annex", "initremote", "backup", "directory", "directory=/mnt/b", "chunk=1MiB",
        ])
        .unwrap();
        match cli.command {
            Commands::Annex {
                subcommand:
                    AnnexCommands::InitRemote {
                        name,
                        remote_type,
                        attrs,
                    },
            } => {
                assert_eq!(name, "backup");
                assert_eq!(remote_type, "directory");
                assert_eq!(
                    attrs,
                    vec![
                        ("directory".to_string(), "/mnt/b".to_string()),
                        ("chunk".to_string(), "1MiB".to_string()),
                    ]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_annex_get_requires_paths() {
        assert!(Cli::try_parse_from(["toolshed", "annex", "get"]).is_err());
    }

    #[test]
    fn test_annex_move_requires_remote() {
        assert!(Cli::try_parse_from(["toolshed", "annex", "move", "a.bam"]).is_err());
        let cli = Cli::try_parse_from(["toolshed", "annex", "move", "a.bam", "--to", "s3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Annex {
                subcommand: AnnexCommands::Move { .. }
            }
        ));
    }

    #[test]
    fn test_rmdup_args() {
        let cli = Cli::try_parse_from([
            "toolshed", "rmdup", "r1.fq", "r2.fq", "o1.fq", "o2.fq", "--unpaired", "u.fq",
        ])
        .unwrap();
        match cli.command {
            Commands::Rmdup(args) => {
                assert_eq!(args.in1, PathBuf::from("r1.fq"));
                assert_eq!(args.out2, PathBuf::from("o2.fq"));
                assert_eq!(args.unpaired, Some(PathBuf::from("u.fq")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("encryption=none"),
            Ok(("encryption".to_string(), "none".to_string()))
        );
        assert_eq!(parse_key_val("k="), Ok(("k".to_string(), String::new())));
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }
}
