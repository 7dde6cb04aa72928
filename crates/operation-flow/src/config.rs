use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::FlowError;

/// Engine-wide knobs shared by every workflow flavor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default = "FlowConfig::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "FlowConfig::default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
    /// Base delay before a retry; multiplied by the attempt number.
    #[serde(default = "FlowConfig::default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Upper bound on remembered item digests per operation.
    #[serde(default = "FlowConfig::default_digest_cap")]
    pub digest_cap: usize,
}

impl FlowConfig {
    fn default_max_attempts() -> u32 {
        5
    }

    fn default_confirm_timeout_ms() -> u64 {
        15_000
    }

    fn default_retry_backoff_ms() -> u64 {
        1_500
    }

    fn default_digest_cap() -> usize {
        1_500
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt.max(1))))
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.max_attempts == 0 {
            return Err(FlowError::InvalidConfig("max_attempts must be at least 1".into()));
        }
        if self.digest_cap == 0 {
            return Err(FlowError::InvalidConfig("digest_cap must be at least 1".into()));
        }
        if self.confirm_timeout_ms == 0 {
            return Err(FlowError::InvalidConfig(
                "confirm_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            confirm_timeout_ms: Self::default_confirm_timeout_ms(),
            retry_backoff_ms: Self::default_retry_backoff_ms(),
            digest_cap: Self::default_digest_cap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: FlowConfig = serde_json::from_str(r#"{"max_attempts": 2}"#).unwrap();
        assert_eq!(cfg.max_attempts, 2);
        assert_eq!(cfg.digest_cap, 1_500);
        assert_eq!(cfg.retry_backoff(3), Duration::from_millis(4_500));
    }

    #[test]
    fn zero_attempts_rejected() {
        let cfg = FlowConfig {
            max_attempts: 0,
            ..FlowConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
