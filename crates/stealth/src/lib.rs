//! Human-motion helpers used by the click policy.
//!
//! [`TrajectoryGenerator`] plans the pointer path for the coordinate-click
//! fallback; [`MotionRng`] is the injectable randomness source shared by the
//! trajectory planner, the locator tie-break and the pacing helpers.

pub mod config;
pub mod rng;
pub mod trajectory;

pub use config::{ConfigError, TrajectoryConfig, TypingTempo};
pub use rng::MotionRng;
pub use trajectory::{minimum_jerk, Trajectory, TrajectoryGenerator, TrajectoryPoint};
