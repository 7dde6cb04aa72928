//! Configuration types for the confirmation tap.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TapConfig {
    /// Bound applied by callers that do not pass their own timeout.
    #[serde(default = "TapConfig::default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
    #[serde(default = "TapConfig::default_max_records_per_endpoint")]
    pub max_records_per_endpoint: usize,
    /// Request-start entries older than this are dropped from the latency map.
    #[serde(default = "TapConfig::default_latency_ttl_ms")]
    pub latency_ttl_ms: u64,
}

impl TapConfig {
    fn default_confirm_timeout_ms() -> u64 {
        15_000
    }

    fn default_max_records_per_endpoint() -> usize {
        64
    }

    fn default_latency_ttl_ms() -> u64 {
        60_000
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_ms: Self::default_confirm_timeout_ms(),
            max_records_per_endpoint: Self::default_max_records_per_endpoint(),
            latency_ttl_ms: Self::default_latency_ttl_ms(),
        }
    }
}
