//! Tunables for pointer trajectories and typing cadence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid trajectory config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryConfig {
    #[serde(default = "TrajectoryConfig::default_min_steps")]
    pub min_steps: u32,
    #[serde(default = "TrajectoryConfig::default_max_steps")]
    pub max_steps: u32,
    /// Target spacing between intermediate points before clamping.
    #[serde(default = "TrajectoryConfig::default_px_per_step")]
    pub px_per_step: f64,
    #[serde(default = "TrajectoryConfig::default_base_ms")]
    pub base_ms: f64,
    #[serde(default = "TrajectoryConfig::default_per_px_ms")]
    pub per_px_ms: f64,
    /// Fraction of the half-extent of the target used for aim jitter.
    #[serde(default = "TrajectoryConfig::default_jitter_ratio")]
    pub jitter_ratio: f64,
    /// Peak sideways deviation as a fraction of travel distance.
    #[serde(default = "TrajectoryConfig::default_arc_ratio")]
    pub arc_ratio: f64,
    #[serde(default = "TrajectoryConfig::default_hotspot_probability")]
    pub hotspot_probability: f64,
    #[serde(default = "TrajectoryConfig::default_hotspot_min_ms")]
    pub hotspot_min_ms: u64,
    #[serde(default = "TrajectoryConfig::default_hotspot_max_ms")]
    pub hotspot_max_ms: u64,
}

impl TrajectoryConfig {
    fn default_min_steps() -> u32 {
        8
    }

    fn default_max_steps() -> u32 {
        60
    }

    fn default_px_per_step() -> f64 {
        12.0
    }

    fn default_base_ms() -> f64 {
        180.0
    }

    fn default_per_px_ms() -> f64 {
        0.9
    }

    fn default_jitter_ratio() -> f64 {
        0.35
    }

    fn default_arc_ratio() -> f64 {
        0.08
    }

    fn default_hotspot_probability() -> f64 {
        0.06
    }

    fn default_hotspot_min_ms() -> u64 {
        25
    }

    fn default_hotspot_max_ms() -> u64 {
        90
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_steps == 0 {
            return Err(ConfigError::Invalid("min_steps must be at least 1".into()));
        }
        if self.max_steps < self.min_steps {
            return Err(ConfigError::Invalid(format!(
                "max_steps ({}) below min_steps ({})",
                self.max_steps, self.min_steps
            )));
        }
        if !(self.px_per_step > 0.0) {
            return Err(ConfigError::Invalid("px_per_step must be positive".into()));
        }
        if !(self.jitter_ratio > 0.0 && self.jitter_ratio <= 1.0) {
            return Err(ConfigError::Invalid("jitter_ratio must be within (0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.hotspot_probability) {
            return Err(ConfigError::Invalid(
                "hotspot_probability must be within 0..=1".into(),
            ));
        }
        if self.hotspot_max_ms < self.hotspot_min_ms {
            return Err(ConfigError::Invalid(
                "hotspot_max_ms below hotspot_min_ms".into(),
            ));
        }
        Ok(())
    }
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            min_steps: Self::default_min_steps(),
            max_steps: Self::default_max_steps(),
            px_per_step: Self::default_px_per_step(),
            base_ms: Self::default_base_ms(),
            per_px_ms: Self::default_per_px_ms(),
            jitter_ratio: Self::default_jitter_ratio(),
            arc_ratio: Self::default_arc_ratio(),
            hotspot_probability: Self::default_hotspot_probability(),
            hotspot_min_ms: Self::default_hotspot_min_ms(),
            hotspot_max_ms: Self::default_hotspot_max_ms(),
        }
    }
}

/// Per-character typing cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingTempo {
    #[serde(default = "TypingTempo::default_per_char_ms")]
    pub per_char_ms: u64,
    #[serde(default = "TypingTempo::default_jitter_ms")]
    pub jitter_ms: u64,
}

impl TypingTempo {
    fn default_per_char_ms() -> u64 {
        140
    }

    fn default_jitter_ms() -> u64 {
        60
    }
}

impl Default for TypingTempo {
    fn default() -> Self {
        Self {
            per_char_ms: Self::default_per_char_ms(),
            jitter_ms: Self::default_jitter_ms(),
        }
    }
}
