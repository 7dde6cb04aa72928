pub mod checkpoints;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod metrics;
pub mod output;
pub mod runtime;

pub use checkpoints::{cmd_checkpoints, CheckpointSummary, CheckpointsArgs};
pub use config::{cmd_config, ConfigArgs};
pub use metrics::{cmd_metrics, MetricsArgs};
