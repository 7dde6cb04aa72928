use thiserror::Error;
use waymark_core_types::{DriveError, FailureKind};

/// Errors emitted by the tap surface.
#[derive(Clone, Debug, Error)]
pub enum TapError {
    #[error("endpoint set is empty")]
    EmptyEndpointSet,
    #[error("no async runtime available for the listener")]
    NoRuntime,
}

impl From<TapError> for DriveError {
    fn from(err: TapError) -> Self {
        DriveError::new(FailureKind::MonitorBindFailed, err.to_string())
    }
}
