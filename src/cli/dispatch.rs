use super::checkpoints::cmd_checkpoints;
use super::config::cmd_config;
use super::env::CliArgs;
use super::metrics::cmd_metrics;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Checkpoints(args) => cmd_checkpoints(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
        Commands::Metrics(args) => cmd_metrics(args, ctx).await,
    }
}
