use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use waymark_cli::cli::context::CliContext;
use waymark_cli::cli::dispatch::dispatch;
use waymark_cli::cli::env::CliArgs;
use waymark_cli::cli::runtime::{init_logging, load_config, load_local_env_overrides};
use waymark_cli::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    load_local_env_overrides();
    init_logging(&cli.log_level, cli.debug)?;
    metrics::register_metrics();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("WAYMARK_GIT_HASH"),
        "starting waymark"
    );

    let loaded = load_config(cli.config.as_ref()).await?;
    let ctx = CliContext::new(loaded.config, loaded.path, cli.output);

    match dispatch(&cli, &ctx).await {
        Ok(()) => Ok(()),
        Err(err) => {
            error!("command failed: {err:#}");
            Err(err)
        }
    }
}
