use std::io;

use thiserror::Error;
use waymark_core_types::{DriveError, FailureKind};

#[derive(Clone, Debug, Error)]
pub enum StoreErrorKind {
    #[error("stale sequence for {operation}: {seq} is not above {last}")]
    StaleSeq {
        operation: String,
        seq: i64,
        last: i64,
    },
    #[error("invalid operation id: {0}")]
    InvalidOperationId(String),
    #[error("io failure: {0}")]
    Io(String),
    #[error("codec failure: {0}")]
    Codec(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Error)]
#[error(transparent)]
pub struct StoreError(pub StoreErrorKind);

impl StoreError {
    pub fn new(kind: StoreErrorKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &StoreErrorKind {
        &self.0
    }
}

impl From<StoreErrorKind> for StoreError {
    fn from(kind: StoreErrorKind) -> Self {
        StoreError(kind)
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError(StoreErrorKind::Io(err.to_string()))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError(StoreErrorKind::Codec(err.to_string()))
    }
}

impl From<StoreError> for DriveError {
    fn from(err: StoreError) -> Self {
        DriveError::new(FailureKind::StoreIoFailure, err.to_string())
    }
}
