use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use operation_flow::{Stage, StageCheckpoint};
use serde::Serialize;
use tracing::{info, warn};
use waymark_checkpoint_store::CheckpointEnvelope;
use waymark_core_types::OperationId;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct CheckpointsArgs {
    #[command(subcommand)]
    pub action: CheckpointsAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CheckpointsAction {
    /// Latest checkpoint of each operation, newest first
    List {
        /// Only operation ids starting with this prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Maximum number of operations to show
        #[arg(long, default_value_t = 20)]
        top: usize,
    },

    /// Latest checkpoint of one operation
    Show {
        /// Operation id
        id: String,
    },

    /// Purge the whole checkpoint history of one operation
    Delete {
        /// Operation id
        id: String,
    },
}

/// Flattened view of a stored checkpoint for listing.
///
/// Stage fields stay empty when the payload is not a stage checkpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckpointSummary {
    pub operation_id: String,
    pub seq: i64,
    pub ts_wall: DateTime<Utc>,
    pub stage: Option<Stage>,
    pub attempt: Option<u32>,
    pub aggregated: Option<u32>,
    pub target_max: Option<u32>,
    pub completed: Option<bool>,
    pub last_error: Option<String>,
}

impl CheckpointSummary {
    pub fn from_envelope(envelope: &CheckpointEnvelope) -> Self {
        let mut summary = Self {
            operation_id: envelope.operation_id.to_string(),
            seq: envelope.seq,
            ts_wall: envelope.ts_wall,
            stage: None,
            attempt: None,
            aggregated: None,
            target_max: None,
            completed: None,
            last_error: None,
        };
        match StageCheckpoint::from_payload(envelope.payload.clone()) {
            Ok(checkpoint) => {
                summary.stage = Some(checkpoint.stage());
                summary.attempt = Some(checkpoint.attempt());
                summary.aggregated = Some(checkpoint.aggregated());
                summary.target_max = Some(checkpoint.target_max());
                summary.completed = Some(checkpoint.completed());
                summary.last_error = checkpoint.last_error().map(|err| err.to_string());
            }
            Err(err) => {
                warn!(operation = %envelope.operation_id, %err, "payload is not a stage checkpoint");
            }
        }
        summary
    }

    fn human_line(&self) -> String {
        let stage = self
            .stage
            .map(|stage| stage.as_str().to_string())
            .unwrap_or_else(|| "-".into());
        let progress = match (self.aggregated, self.target_max) {
            (Some(done), Some(target)) => format!("{done}/{target}"),
            _ => "-".into(),
        };
        let state = match self.completed {
            Some(true) => "completed",
            Some(false) => "open",
            None => "unknown",
        };
        format!(
            "{:<36} seq={:<5} {:<18} {:<9} {:<9} {}",
            self.operation_id,
            self.seq,
            stage,
            progress,
            state,
            self.ts_wall.to_rfc3339()
        )
    }
}

pub async fn cmd_checkpoints(args: CheckpointsArgs, ctx: &CliContext) -> Result<()> {
    let store = ctx.store()?;
    let json = ctx.output().is_json();

    match args.action {
        CheckpointsAction::List { prefix, top } => {
            let latest = store
                .list_latest(&prefix, top)
                .await
                .context("failed to list checkpoints")?;
            let summaries: Vec<_> = latest.iter().map(CheckpointSummary::from_envelope).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No checkpoints found");
            } else {
                for summary in &summaries {
                    println!("{}", summary.human_line());
                }
            }
        }
        CheckpointsAction::Show { id } => {
            let operation = OperationId::new(id.clone());
            let Some(envelope) = store
                .load_latest(&operation)
                .await
                .with_context(|| format!("failed to load checkpoint for {id}"))?
            else {
                bail!("no checkpoint stored for operation {id}");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                let summary = CheckpointSummary::from_envelope(&envelope);
                println!("{}", summary.human_line());
                if let Some(err) = &summary.last_error {
                    println!("last error: {err}");
                }
                println!("{}", serde_json::to_string_pretty(&envelope.payload)?);
            }
        }
        CheckpointsAction::Delete { id } => {
            let operation = OperationId::new(id.clone());
            store
                .delete(&operation)
                .await
                .with_context(|| format!("failed to delete checkpoints for {id}"))?;
            info!(operation = %id, "checkpoint history deleted");
            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                println!("Deleted checkpoint history for {id}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_reads_stage_fields() {
        let checkpoint = StageCheckpoint::create_initial(10, 5, 100)
            .builder()
            .stage(Stage::Aggregate)
            .attempt(2)
            .aggregated(4)
            .build();
        let envelope = CheckpointEnvelope::new(
            OperationId::new("feed-1"),
            3,
            checkpoint.to_payload().unwrap(),
        );

        let summary = CheckpointSummary::from_envelope(&envelope);
        assert_eq!(summary.stage, Some(Stage::Aggregate));
        assert_eq!(summary.attempt, Some(2));
        assert_eq!(summary.aggregated, Some(4));
        assert_eq!(summary.completed, Some(false));
        assert!(summary.human_line().contains("4/10"));
    }

    #[test]
    fn foreign_payload_leaves_stage_fields_empty() {
        let envelope = CheckpointEnvelope::new(OperationId::new("x"), 1, json!({"note": 1}));
        let summary = CheckpointSummary::from_envelope(&envelope);
        assert_eq!(summary.stage, None);
        assert!(summary.human_line().contains("unknown"));
    }
}
