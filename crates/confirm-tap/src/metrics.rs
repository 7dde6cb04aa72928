use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{core::Collector, histogram_opts, opts, HistogramVec, IntCounterVec, Registry};
use tracing::error;

lazy_static! {
    static ref CONFIRM_LATENCY: HistogramVec = HistogramVec::new(
        histogram_opts!(
            "waymark_confirm_latency_seconds",
            "Request-to-response latency of monitored endpoints",
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0]
        ),
        &["endpoint"]
    )
    .unwrap();
    static ref CONFIRM_RECORDS_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "waymark_confirm_records_total",
            "Monitored responses by endpoint and outcome"
        ),
        &["endpoint", "outcome"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register confirm metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, CONFIRM_LATENCY.clone());
    register(registry, CONFIRM_RECORDS_TOTAL.clone());
}

pub(crate) fn record_response(endpoint: &str, ok: bool, latency: Option<Duration>) {
    let outcome = if ok { "ok" } else { "error" };
    CONFIRM_RECORDS_TOTAL
        .with_label_values(&[endpoint, outcome])
        .inc();
    if let Some(latency) = latency {
        CONFIRM_LATENCY
            .with_label_values(&[endpoint])
            .observe(latency.as_secs_f64());
    }
}
