use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::TypingTempo;

lazy_static! {
    static ref SHARED: MotionRng = MotionRng::from_entropy();
}

/// Cloneable handle to a random source. Clones share one generator.
///
/// Production code uses the process-wide unseeded source; tests pass
/// [`MotionRng::seeded`] to make trajectories and tie-breaks reproducible.
#[derive(Clone, Debug)]
pub struct MotionRng {
    inner: Arc<Mutex<StdRng>>,
}

impl MotionRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// Handle to the process-wide source.
    pub fn shared() -> Self {
        SHARED.clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Uniform in `[lo, hi]`; collapses to `lo` for an empty range.
    pub fn range_f64(&self, lo: f64, hi: f64) -> f64 {
        if !(hi > lo) {
            return lo;
        }
        self.with(|rng| rng.gen_range(lo..=hi))
    }

    pub fn range_u64(&self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        self.with(|rng| rng.gen_range(lo..=hi))
    }

    pub fn chance(&self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.with(|rng| rng.gen_bool(probability))
    }

    /// Random index below `len`, `None` when empty.
    pub fn pick_index(&self, len: usize) -> Option<usize> {
        match len {
            0 => None,
            1 => Some(0),
            n => Some(self.with(|rng| rng.gen_range(0..n))),
        }
    }

    pub fn typing_delay(&self, tempo: &TypingTempo) -> Duration {
        let jitter = self.range_u64(0, tempo.jitter_ms);
        Duration::from_millis(tempo.per_char_ms + jitter)
    }
}

impl Default for MotionRng {
    fn default() -> Self {
        Self::shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_repeat() {
        let a = MotionRng::seeded(42);
        let b = MotionRng::seeded(42);
        let left: Vec<f64> = (0..5).map(|_| a.range_f64(0.0, 10.0)).collect();
        let right: Vec<f64> = (0..5).map(|_| b.range_f64(0.0, 10.0)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn degenerate_ranges_do_not_panic() {
        let rng = MotionRng::seeded(1);
        assert_eq!(rng.range_f64(3.0, 3.0), 3.0);
        assert_eq!(rng.range_u64(9, 2), 9);
        assert_eq!(rng.pick_index(0), None);
        assert_eq!(rng.pick_index(1), Some(0));
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.0));
    }

    #[test]
    fn typing_delay_stays_in_band() {
        let rng = MotionRng::seeded(7);
        let tempo = TypingTempo {
            per_char_ms: 100,
            jitter_ms: 20,
        };
        for _ in 0..50 {
            let ms = rng.typing_delay(&tempo).as_millis();
            assert!((100..=120).contains(&ms));
        }
    }
}
