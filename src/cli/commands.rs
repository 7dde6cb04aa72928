use clap::Subcommand;

use super::checkpoints::CheckpointsArgs;
use super::config::ConfigArgs;
use super::metrics::MetricsArgs;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Inspect or purge stored operation checkpoints
    Checkpoints(CheckpointsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Process metrics
    Metrics(MetricsArgs),
}
