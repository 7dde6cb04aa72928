use anyhow::{Context, Result};
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{Encoder, Registry, TextEncoder};

use confirm_tap::metrics as confirm_metrics;
use operation_flow::metrics as flow_metrics;
use tool_click::metrics as click_metrics;
use waymark_checkpoint_store::metrics as store_metrics;

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        let registry = global_registry();
        store_metrics::register_metrics(registry);
        click_metrics::register_metrics(registry);
        confirm_metrics::register_metrics(registry);
        flow_metrics::register_metrics(registry);
    });
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

/// Prometheus text exposition of everything registered so far.
pub fn render_text() -> Result<String> {
    register_metrics();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&global_registry().gather(), &mut buffer)
        .context("failed to encode prometheus metrics")?;
    String::from_utf8(buffer).context("metrics output was not utf-8")
}
