use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration, overrides included
    Show,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            if ctx.output().is_json() {
                println!("{}", serde_json::to_string_pretty(ctx.config())?);
            } else {
                println!("Current configuration ({}):", ctx.config_path().display());
                println!("{}", serde_yaml::to_string(ctx.config())?);
            }
        }
    }
    Ok(())
}
