use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::CliContext;
use crate::metrics::render_text;

#[derive(Args, Clone, Debug)]
pub struct MetricsArgs {
    #[command(subcommand)]
    pub command: MetricsCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum MetricsCommand {
    /// Print the Prometheus text exposition of this process's collectors
    Dump,
}

pub async fn cmd_metrics(args: MetricsArgs, ctx: &CliContext) -> Result<()> {
    match args.command {
        MetricsCommand::Dump => {
            let text = render_text()?;
            if ctx.output().is_json() {
                println!("{}", serde_json::json!({ "format": "prometheus-text", "body": text }));
            } else {
                print!("{text}");
            }
        }
    }
    Ok(())
}
