//! Minimum-jerk pointer paths for the coordinate-click fallback.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use waymark_core_types::{Point, Rect};

use crate::config::TrajectoryConfig;
use crate::rng::MotionRng;

/// Smallest offset from the centroid an aim point may have.
const MIN_AIM_OFFSET_PX: f64 = 0.25;

/// Normalised position along the path at normalised time `tau`.
///
/// `s(τ) = 10τ³ − 15τ⁴ + 6τ⁵`: zero velocity and acceleration at both ends.
pub fn minimum_jerk(tau: f64) -> f64 {
    let t = tau.clamp(0.0, 1.0);
    let t3 = t * t * t;
    t3 * (10.0 - 15.0 * t + 6.0 * t * t)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub at: Point,
    /// Pause after moving to `at`.
    pub pause_ms: u64,
    pub hotspot: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub points: Vec<TrajectoryPoint>,
    pub aim: Point,
    pub total_ms: u64,
    pub max_step_px: f64,
    pub mean_step_px: f64,
}

impl Trajectory {
    pub fn steps(&self) -> usize {
        self.points.len()
    }

    pub fn hotspots(&self) -> usize {
        self.points.iter().filter(|p| p.hotspot).count()
    }
}

#[derive(Clone, Debug, Default)]
pub struct TrajectoryGenerator {
    config: TrajectoryConfig,
}

impl TrajectoryGenerator {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    /// Plan a path from `from` to a jittered point inside `target`.
    pub fn plan(&self, from: Point, target: &Rect, rng: &MotionRng) -> Trajectory {
        let cfg = &self.config;
        let aim = self.aim_point(target, rng);

        let dx = aim.x - from.x;
        let dy = aim.y - from.y;
        let distance = (dx * dx + dy * dy).sqrt();

        let raw_steps = (distance / cfg.px_per_step.max(f64::EPSILON)).ceil() as u32;
        let min_steps = cfg.min_steps.max(1);
        let steps = raw_steps.clamp(min_steps, cfg.max_steps.max(min_steps)) as usize;

        // Fitts-like movement time with a little per-gesture variance.
        let movement_ms =
            (cfg.base_ms + cfg.per_px_ms * distance) * rng.range_f64(0.9, 1.1);
        let step_ms = (movement_ms / steps as f64).max(1.0).round() as u64;

        // Unit normal to the travel direction, for the sideways arc.
        let (nx, ny) = if distance > f64::EPSILON {
            (-dy / distance, dx / distance)
        } else {
            (0.0, 0.0)
        };
        let arc = distance * cfg.arc_ratio * rng.range_f64(-1.0, 1.0);

        let mut points = Vec::with_capacity(steps);
        let mut previous = from;
        let mut max_step_px: f64 = 0.0;
        let mut travelled = 0.0;
        let mut total_ms = 0;

        for i in 1..=steps {
            let tau = i as f64 / steps as f64;
            let at = if i == steps {
                aim
            } else {
                let s = minimum_jerk(tau);
                let bow = arc * (PI * tau).sin();
                Point::new(from.x + dx * s + nx * bow, from.y + dy * s + ny * bow)
            };

            let hotspot = i < steps && rng.chance(cfg.hotspot_probability);
            let mut pause_ms = step_ms;
            if hotspot {
                pause_ms += rng.range_u64(cfg.hotspot_min_ms, cfg.hotspot_max_ms);
            }

            let step = previous.distance_to(&at);
            max_step_px = max_step_px.max(step);
            travelled += step;
            total_ms += pause_ms;
            previous = at;

            points.push(TrajectoryPoint {
                at,
                pause_ms,
                hotspot,
            });
        }

        Trajectory {
            mean_step_px: travelled / steps as f64,
            points,
            aim,
            total_ms,
            max_step_px,
        }
    }

    /// Centre plus bounded jitter, never the exact centroid. Targets too
    /// small for a whole-pixel nudge still get a sub-pixel one.
    fn aim_point(&self, target: &Rect, rng: &MotionRng) -> Point {
        let centre = target.center();
        let ratio = if self.config.jitter_ratio.is_finite() {
            self.config.jitter_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let reach_x = (target.width / 2.0).max(0.0) * ratio;
        let reach_y = (target.height / 2.0).max(0.0) * ratio;

        let mut ox = rng.range_f64(-reach_x, reach_x);
        let oy = rng.range_f64(-reach_y, reach_y);
        if ox.abs() < 0.5 && oy.abs() < 0.5 {
            let nudge = if reach_x >= 1.0 {
                1.0
            } else {
                (target.width / 4.0).clamp(MIN_AIM_OFFSET_PX, 1.0)
            };
            ox = if rng.chance(0.5) { nudge } else { -nudge };
        }
        Point::new(centre.x + ox, centre.y + oy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TrajectoryGenerator {
        TrajectoryGenerator::new(TrajectoryConfig::default())
    }

    #[test]
    fn minimum_jerk_profile_shape() {
        assert_eq!(minimum_jerk(0.0), 0.0);
        assert!((minimum_jerk(1.0) - 1.0).abs() < 1e-12);
        assert!((minimum_jerk(0.5) - 0.5).abs() < 1e-12);
        // slow start, fast middle
        assert!(minimum_jerk(0.1) < 0.1);
        assert!(minimum_jerk(0.9) > 0.9);
        let mut last = 0.0;
        for i in 1..=100 {
            let s = minimum_jerk(i as f64 / 100.0);
            assert!(s >= last);
            last = s;
        }
    }

    #[test]
    fn path_ends_inside_target_but_off_centre() {
        let target = Rect::new(400.0, 300.0, 120.0, 40.0);
        for seed in 0..32 {
            let plan = generator().plan(Point::new(10.0, 10.0), &target, &MotionRng::seeded(seed));
            let last = plan.points.last().expect("at least one point");
            assert_eq!(last.at, plan.aim);
            assert!(target.contains(&plan.aim));
            assert_ne!(plan.aim, target.center());
        }
    }

    #[test]
    fn zero_jitter_still_misses_the_centroid() {
        let gen = TrajectoryGenerator::new(TrajectoryConfig {
            jitter_ratio: 0.0,
            ..TrajectoryConfig::default()
        });
        for target in [Rect::new(400.0, 300.0, 120.0, 40.0), Rect::new(50.0, 50.0, 0.6, 0.6)] {
            for seed in 0..16 {
                let plan = gen.plan(Point::new(10.0, 10.0), &target, &MotionRng::seeded(seed));
                assert_ne!(plan.aim, target.center());
                assert!((plan.aim.x - target.center().x).abs() <= 1.0);
            }
        }
    }

    #[test]
    fn step_count_is_clamped() {
        let cfg = TrajectoryConfig {
            min_steps: 5,
            max_steps: 20,
            ..TrajectoryConfig::default()
        };
        let gen = TrajectoryGenerator::new(cfg);
        let rng = MotionRng::seeded(3);
        let near = gen.plan(Point::new(100.0, 100.0), &Rect::new(100.0, 100.0, 4.0, 4.0), &rng);
        assert_eq!(near.steps(), 5);
        let far = gen.plan(Point::new(0.0, 0.0), &Rect::new(2000.0, 1500.0, 10.0, 10.0), &rng);
        assert_eq!(far.steps(), 20);
    }

    #[test]
    fn steps_are_small_near_the_ends() {
        let plan = generator().plan(
            Point::new(0.0, 0.0),
            &Rect::new(600.0, 0.0, 20.0, 20.0),
            &MotionRng::seeded(11),
        );
        let n = plan.points.len();
        let first = Point::new(0.0, 0.0).distance_to(&plan.points[0].at);
        let middle = plan.points[n / 2 - 1].at.distance_to(&plan.points[n / 2].at);
        assert!(first < middle, "first {first} middle {middle}");
        assert!(plan.max_step_px >= plan.mean_step_px);
    }

    #[test]
    fn hotspots_add_pauses() {
        let cfg = TrajectoryConfig {
            hotspot_probability: 1.0,
            hotspot_min_ms: 50,
            hotspot_max_ms: 50,
            ..TrajectoryConfig::default()
        };
        let plan = TrajectoryGenerator::new(cfg).plan(
            Point::new(0.0, 0.0),
            &Rect::new(300.0, 300.0, 30.0, 30.0),
            &MotionRng::seeded(5),
        );
        assert_eq!(plan.hotspots(), plan.steps() - 1);
        let summed: u64 = plan.points.iter().map(|p| p.pause_ms).sum();
        assert_eq!(summed, plan.total_ms);
        assert!(plan.points.iter().filter(|p| p.hotspot).all(|p| p.pause_ms >= 51));
    }

    #[test]
    fn same_seed_same_path() {
        let target = Rect::new(50.0, 80.0, 60.0, 20.0);
        let a = generator().plan(Point::new(500.0, 500.0), &target, &MotionRng::seeded(99));
        let b = generator().plan(Point::new(500.0, 500.0), &target, &MotionRng::seeded(99));
        assert_eq!(a, b);
    }
}
