use serde::{Deserialize, Serialize};
use std::time::Duration;

use stealth::{ConfigError, TrajectoryConfig, TypingTempo};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClickPolicyView {
    /// Synthesised in-page click tier. Off unless explicitly enabled.
    #[serde(default)]
    pub scripted_dispatch_enabled: bool,
    #[serde(default = "ClickPolicyView::default_busy_wait_ms")]
    pub busy_wait_ms: u64,
    #[serde(default = "ClickPolicyView::default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "ClickPolicyView::default_hover_dwell_min_ms")]
    pub hover_dwell_min_ms: u64,
    #[serde(default = "ClickPolicyView::default_hover_dwell_max_ms")]
    pub hover_dwell_max_ms: u64,
    #[serde(default)]
    pub trajectory: TrajectoryConfig,
    #[serde(default)]
    pub typing: TypingTempo,
}

impl ClickPolicyView {
    fn default_busy_wait_ms() -> u64 {
        800
    }

    fn default_backoff_base_ms() -> u64 {
        150
    }

    fn default_hover_dwell_min_ms() -> u64 {
        60
    }

    fn default_hover_dwell_max_ms() -> u64 {
        220
    }

    /// Rejects settings that would misbehave mid-click, such as an
    /// out-of-range hotspot probability or an inverted dwell band.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.trajectory.validate()?;
        if self.hover_dwell_max_ms < self.hover_dwell_min_ms {
            return Err(ConfigError::Invalid(
                "hover_dwell_max_ms below hover_dwell_min_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn busy_wait(&self) -> Duration {
        Duration::from_millis(self.busy_wait_ms)
    }

    /// Delay before the `attempt`-th tier (1-based); none before the first.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms * u64::from(attempt.saturating_sub(1)))
    }
}

impl Default for ClickPolicyView {
    fn default() -> Self {
        Self {
            scripted_dispatch_enabled: false,
            busy_wait_ms: Self::default_busy_wait_ms(),
            backoff_base_ms: Self::default_backoff_base_ms(),
            hover_dwell_min_ms: Self::default_hover_dwell_min_ms(),
            hover_dwell_max_ms: Self::default_hover_dwell_max_ms(),
            trajectory: TrajectoryConfig::default(),
            typing: TypingTempo::default(),
        }
    }
}
