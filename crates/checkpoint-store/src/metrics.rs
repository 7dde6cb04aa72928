use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounter, IntCounterVec, Registry};
use tracing::error;

lazy_static! {
    static ref CHECKPOINT_SAVES_TOTAL: IntCounterVec = IntCounterVec::new(
        opts!(
            "waymark_checkpoint_saves_total",
            "Checkpoint appends grouped by outcome"
        ),
        &["outcome"]
    )
    .unwrap();
    static ref CHECKPOINT_LOADS_TOTAL: IntCounter = IntCounter::new(
        "waymark_checkpoint_loads_total",
        "Latest-checkpoint lookups served"
    )
    .unwrap();
    static ref CHECKPOINT_COMPACTIONS_TOTAL: IntCounter = IntCounter::new(
        "waymark_checkpoint_compactions_total",
        "Checkpoint logs rewritten down to their retained history"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register checkpoint metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, CHECKPOINT_SAVES_TOTAL.clone());
    register(registry, CHECKPOINT_LOADS_TOTAL.clone());
    register(registry, CHECKPOINT_COMPACTIONS_TOTAL.clone());
}

pub fn record_save(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    CHECKPOINT_SAVES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_load() {
    CHECKPOINT_LOADS_TOTAL.inc();
}

pub fn record_compaction() {
    CHECKPOINT_COMPACTIONS_TOTAL.inc();
}
