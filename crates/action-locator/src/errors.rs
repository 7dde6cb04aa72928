//! Error types for locator system

use thiserror::Error;
use waymark_core_types::{DriveError, FailureKind};

#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Alias table could not be parsed
    #[error("invalid alias table: {0}")]
    AliasTable(String),

    /// A strategy failed while querying the page
    #[error("strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    #[error("locator cancelled")]
    Cancelled,
}

impl From<LocatorError> for DriveError {
    fn from(err: LocatorError) -> Self {
        let kind = match err {
            LocatorError::Cancelled => FailureKind::Cancelled,
            _ => FailureKind::ElementNotFound,
        };
        DriveError::new(kind, err.to_string())
    }
}
