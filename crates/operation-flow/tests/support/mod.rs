//! Collaborator doubles shared by the engine tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use action_locator::{AliasTable, DefaultElementLocator, LocatorConfig};
use async_trait::async_trait;
use confirm_tap::{ActionConfirmationMonitor, EndpointSet, MonitoredRecord, ToggleOutcome};
use operation_flow::PageGuard;
use parking_lot::Mutex;
use serde_json::json;
use stealth::MotionRng;
use tokio_util::sync::CancellationToken;
use tool_click::{
    ClickError, ClickParams, ClickPolicy, ClickReport, ClickTier, DomState, ExecCtx,
    PhysicalAssessment,
};
use waymark_core_types::{DriveError, ElementHandle, PageSession, Rect};

/// Monitor double: each bind loads the next scripted batch.
pub struct StubMonitor {
    bind_ok: bool,
    batches: Mutex<VecDeque<Vec<MonitoredRecord>>>,
    current: Mutex<Vec<MonitoredRecord>>,
    toggles: Mutex<VecDeque<ToggleOutcome>>,
    binds: Mutex<u32>,
}

impl StubMonitor {
    pub fn new() -> Arc<Self> {
        Self::build(true, Vec::new(), Vec::new())
    }

    pub fn failing_bind() -> Arc<Self> {
        Self::build(false, Vec::new(), Vec::new())
    }

    pub fn with_batches(batches: Vec<Vec<MonitoredRecord>>) -> Arc<Self> {
        Self::build(true, batches, Vec::new())
    }

    pub fn with_toggles(toggles: Vec<ToggleOutcome>) -> Arc<Self> {
        Self::build(true, Vec::new(), toggles)
    }

    fn build(
        bind_ok: bool,
        batches: Vec<Vec<MonitoredRecord>>,
        toggles: Vec<ToggleOutcome>,
    ) -> Arc<Self> {
        Arc::new(Self {
            bind_ok,
            batches: Mutex::new(batches.into()),
            current: Mutex::new(Vec::new()),
            toggles: Mutex::new(toggles.into()),
            binds: Mutex::new(0),
        })
    }

    pub fn binds(&self) -> u32 {
        *self.binds.lock()
    }
}

#[async_trait]
impl ActionConfirmationMonitor for StubMonitor {
    async fn setup_monitor(&self, _session: &dyn PageSession, endpoints: EndpointSet) -> bool {
        assert!(!endpoints.is_empty());
        if !self.bind_ok {
            return false;
        }
        *self.binds.lock() += 1;
        let next = self.batches.lock().pop_front().unwrap_or_default();
        *self.current.lock() = next;
        true
    }

    async fn wait_for_responses(&self, _endpoint: &str, timeout: Duration, min_count: usize) -> bool {
        let ready = self.current.lock().iter().filter(|r| r.ok).count() >= min_count;
        if !ready {
            tokio::time::sleep(timeout).await;
        }
        ready
    }

    fn get_monitored_details(&self, endpoint: &str) -> Vec<MonitoredRecord> {
        self.current
            .lock()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    fn clear_monitored_data(&self, _endpoint: Option<&str>) {
        self.current.lock().clear();
    }

    async fn await_toggle(
        &self,
        endpoint: &str,
        timeout: Duration,
        _cancel: &CancellationToken,
    ) -> ToggleOutcome {
        let outcome = self
            .toggles
            .lock()
            .pop_front()
            .unwrap_or(ToggleOutcome::TimedOut);
        match outcome {
            ToggleOutcome::TimedOut => tokio::time::sleep(timeout).await,
            ToggleOutcome::Confirmed => {
                self.current
                    .lock()
                    .push(MonitoredRecord::from_response(endpoint, "t", "/api/toggle", 200, json!({}), None));
            }
            _ => {}
        }
        outcome
    }
}

/// Click double that records labels and can be told to exhaust.
#[derive(Default)]
pub struct StubClickPolicy {
    exhaust: bool,
    clicks: Mutex<Vec<String>>,
    typed: Mutex<Vec<String>>,
}

impl StubClickPolicy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn exhausting() -> Arc<Self> {
        Arc::new(Self {
            exhaust: true,
            ..Self::default()
        })
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.typed.lock().clone()
    }

    fn report() -> ClickReport {
        ClickReport {
            tier: ClickTier::Regular,
            attempts: 1,
            dom: DomState::default(),
            physical: PhysicalAssessment::default(),
            trajectory: None,
            started_at: Instant::now(),
            latency_ms: 0,
        }
    }
}

#[async_trait]
impl ClickPolicy for StubClickPolicy {
    async fn click(
        &self,
        _ctx: &ExecCtx,
        _session: &dyn PageSession,
        params: ClickParams,
    ) -> Result<ClickReport, ClickError> {
        self.clicks.lock().push(params.label);
        if self.exhaust {
            return Err(ClickError::Exhausted {
                attempts: 3,
                last: DriveError::session("coordinate click failed"),
            });
        }
        Ok(Self::report())
    }

    async fn type_into(
        &self,
        ctx: &ExecCtx,
        session: &dyn PageSession,
        params: ClickParams,
        text: &str,
    ) -> Result<ClickReport, ClickError> {
        let report = self.click(ctx, session, params).await?;
        self.typed.lock().push(text.to_string());
        Ok(report)
    }
}

/// Guard double with a fixed answer.
pub struct StaticGuard(pub bool);

#[async_trait]
impl PageGuard for StaticGuard {
    async fn ensure_on_known_entry_state(&self, _session: &dyn PageSession) -> bool {
        self.0
    }
}

pub fn locator() -> Arc<DefaultElementLocator> {
    let config = LocatorConfig {
        max_scroll_rounds: 1,
        ..LocatorConfig::default()
    };
    Arc::new(DefaultElementLocator::with_rng(
        Arc::new(AliasTable::new()),
        config,
        MotionRng::seeded(11),
    ))
}

pub fn button(id: &str, role: &str, name: &str) -> ElementHandle {
    ElementHandle::new(id)
        .visible(true)
        .with_role(role, Some(name))
        .with_rect(Rect::new(500.0, 300.0, 80.0, 32.0))
}

/// One successful feed response carrying `ids`.
pub fn batch(endpoint: &str, ids: &[&str]) -> Vec<MonitoredRecord> {
    let items: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    vec![MonitoredRecord::from_response(
        endpoint,
        "req",
        "/api/feed",
        200,
        json!({ "data": { "items": items } }),
        None,
    )]
}
