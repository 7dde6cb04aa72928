use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("WAYMARK_GIT_HASH"),
    ", built ",
    env!("WAYMARK_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "waymark", author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: crate::cli::output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::checkpoints::CheckpointsAction;
    use crate::cli::output::OutputFormat;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn global_flags_and_list_defaults() {
        let args = CliArgs::try_parse_from([
            "waymark", "--output", "json", "-d", "checkpoints", "list", "--prefix", "like-",
        ])
        .unwrap();
        assert!(args.debug);
        assert_eq!(args.output, OutputFormat::Json);
        let Commands::Checkpoints(cmd) = args.command else {
            panic!("expected checkpoints command");
        };
        match cmd.action {
            CheckpointsAction::List { prefix, top } => {
                assert_eq!(prefix, "like-");
                assert_eq!(top, 20);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
}
