use serde::{Deserialize, Serialize};
use thiserror::Error;
use waymark_core_types::{DriveError, FailureKind};

use crate::stage::Stage;

/// Stage failure recorded as `LastError` on the checkpoint.
#[derive(Clone, Debug, Eq, PartialEq, Error, Serialize, Deserialize)]
#[error("{stage} failed ({kind}): {message}")]
pub struct StageError {
    pub kind: FailureKind,
    pub stage: Stage,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
        }
    }

    pub fn from_drive(stage: Stage, err: DriveError) -> Self {
        Self::new(stage, err.kind, err.message)
    }

    pub fn cancelled(stage: Stage) -> Self {
        Self::new(stage, FailureKind::Cancelled, "operation cancelled")
    }
}

/// Errors raised while assembling an engine.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("invalid flow configuration: {0}")]
    InvalidConfig(String),
}

impl From<FlowError> for DriveError {
    fn from(err: FlowError) -> Self {
        DriveError::new(FailureKind::ContextNotReady, err.to_string())
    }
}
