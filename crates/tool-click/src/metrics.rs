use lazy_static::lazy_static;
use prometheus::{
    core::Collector, histogram_opts, opts, Histogram, IntCounterVec, Registry,
};
use tracing::error;

use crate::model::ClickTier;

lazy_static! {
    static ref INJECTED_SCRIPT_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "waymark_injected_script_total",
            "In-page script evaluations that passed the gate, by path label"
        ),
        &["path"]
    )
    .unwrap();
    static ref CLICK_TIER_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!("waymark_click_tier_total", "Click tier attempts by outcome"),
        &["tier", "outcome"]
    )
    .unwrap();
    static ref TRAJECTORY_STEPS: Histogram = Histogram::with_opts(histogram_opts!(
        "waymark_trajectory_steps",
        "Intermediate pointer positions per coordinate click",
        vec![4.0, 8.0, 16.0, 24.0, 32.0, 48.0, 64.0, 96.0]
    ))
    .unwrap();
    static ref TRAJECTORY_DURATION: Histogram = Histogram::with_opts(histogram_opts!(
        "waymark_trajectory_duration_seconds",
        "Planned pointer travel time per coordinate click",
        vec![0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.5, 5.0]
    ))
    .unwrap();
    static ref TRAJECTORY_STEP_DISTANCE: Histogram = Histogram::with_opts(histogram_opts!(
        "waymark_trajectory_step_distance_px",
        "Distance covered by each trajectory step",
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 80.0]
    ))
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register click metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, INJECTED_SCRIPT_TOTAL.clone());
    register(registry, CLICK_TIER_TOTAL.clone());
    register(registry, TRAJECTORY_STEPS.clone());
    register(registry, TRAJECTORY_DURATION.clone());
    register(registry, TRAJECTORY_STEP_DISTANCE.clone());
}

pub(crate) fn record_injected_script(path: &str) {
    INJECTED_SCRIPT_TOTAL.with_label_values(&[path]).inc();
}

/// Current audit count for a script path label.
pub fn injected_script_count(path: &str) -> u64 {
    INJECTED_SCRIPT_TOTAL.with_label_values(&[path]).get()
}

pub(crate) fn record_tier(tier: ClickTier, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    CLICK_TIER_TOTAL
        .with_label_values(&[tier.as_str(), outcome])
        .inc();
}

pub(crate) fn record_tier_skipped(tier: ClickTier) {
    CLICK_TIER_TOTAL
        .with_label_values(&[tier.as_str(), "skipped"])
        .inc();
}

pub(crate) fn record_trajectory(steps: usize, total_ms: u64, step_distances: impl Iterator<Item = f64>) {
    TRAJECTORY_STEPS.observe(steps as f64);
    TRAJECTORY_DURATION.observe(total_ms as f64 / 1000.0);
    for distance in step_distances {
        TRAJECTORY_STEP_DISTANCE.observe(distance);
    }
}
