use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{core::Collector, histogram_opts, opts, HistogramVec, IntCounterVec, Registry};
use tracing::error;

use crate::stage::Stage;

lazy_static! {
    static ref STAGE_DURATION: HistogramVec = HistogramVec::new(
        histogram_opts!(
            "waymark_stage_duration_seconds",
            "Wall time spent in each workflow stage",
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        ),
        &["stage"]
    )
    .unwrap();
    static ref STAGE_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "waymark_stage_failures_total",
            "Stage failures by stage and coarse workflow endpoint"
        ),
        &["stage", "endpoint"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register flow metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, STAGE_DURATION.clone());
    register(registry, STAGE_FAILURES_TOTAL.clone());
}

pub(crate) fn observe_stage(stage: Stage, elapsed: Duration) {
    STAGE_DURATION
        .with_label_values(&[stage.as_str()])
        .observe(elapsed.as_secs_f64());
}

pub(crate) fn record_failure(stage: Stage, endpoint: &str) {
    STAGE_FAILURES_TOTAL
        .with_label_values(&[stage.as_str(), endpoint])
        .inc();
}

/// Current failure count for a stage/endpoint pair.
pub fn stage_failure_count(stage: Stage, endpoint: &str) -> u64 {
    STAGE_FAILURES_TOTAL
        .with_label_values(&[stage.as_str(), endpoint])
        .get()
}
