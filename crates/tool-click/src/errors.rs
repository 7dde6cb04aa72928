use thiserror::Error;

use waymark_core_types::{DriveError, FailureKind};

#[derive(Debug, Error)]
pub enum ClickError {
    /// Raised by preflight before any click tier runs.
    #[error("target control is disabled")]
    TargetDisabled,
    #[error("all click tiers failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: DriveError },
    #[error("text input failed: {0}")]
    Input(DriveError),
    #[error("operation cancelled")]
    Cancelled,
}

impl ClickError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClickError::TargetDisabled => FailureKind::TargetDisabled,
            ClickError::Exhausted { .. } => FailureKind::ClickExhausted,
            ClickError::Input(err) => err.kind,
            ClickError::Cancelled => FailureKind::Cancelled,
        }
    }
}

impl From<ClickError> for DriveError {
    fn from(err: ClickError) -> Self {
        DriveError::new(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_errors_convert_with_their_kind() {
        let last = DriveError::new(FailureKind::EvaluationDenied, "path 'probe_dom' denied");
        let exhausted: DriveError = ClickError::Exhausted { attempts: 3, last }.into();
        assert_eq!(exhausted.kind, FailureKind::ClickExhausted);
        assert!(exhausted.message.contains("evaluation_denied"));

        let disabled: DriveError = ClickError::TargetDisabled.into();
        assert_eq!(disabled.kind, FailureKind::TargetDisabled);
        let input: DriveError =
            ClickError::Input(DriveError::new(FailureKind::Session, "keyboard gone")).into();
        assert_eq!(input.kind, FailureKind::Session);
    }
}
