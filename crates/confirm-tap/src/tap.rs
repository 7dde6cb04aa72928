use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use waymark_core_types::{NetworkEvent, PageSession};

use crate::config::TapConfig;
use crate::endpoint::EndpointSet;
use crate::errors::TapError;
use crate::metrics;
use crate::monitor::{ActionConfirmationMonitor, ToggleOutcome};
use crate::record::MonitoredRecord;

/// Request start, keyed by request id in the latency map.
#[derive(Clone, Debug)]
struct Inflight {
    started: Instant,
    endpoint: String,
    url: String,
}

struct Shared {
    config: TapConfig,
    endpoints: RwLock<EndpointSet>,
    records: DashMap<String, Vec<MonitoredRecord>>,
    inflight: DashMap<String, Inflight>,
    notify: Notify,
}

impl Shared {
    fn ingest(&self, event: NetworkEvent) {
        match event {
            NetworkEvent::RequestWillBeSent {
                request_id, url, ..
            } => {
                let endpoint = self.endpoints.read().match_url(&url).map(|r| r.name.clone());
                if let Some(endpoint) = endpoint {
                    self.inflight.insert(
                        request_id,
                        Inflight {
                            started: Instant::now(),
                            endpoint,
                            url,
                        },
                    );
                    self.prune_inflight();
                }
            }
            NetworkEvent::ResponseReceived {
                request_id,
                url,
                status,
                body,
            } => {
                let started = self.inflight.remove(&request_id).map(|(_, f)| f);
                let endpoint = self.endpoints.read().match_url(&url).map(|r| r.name.clone());
                let Some(endpoint) = endpoint else {
                    return;
                };
                let latency = started.map(|f| f.started.elapsed());
                let record = MonitoredRecord::from_response(
                    &endpoint,
                    &request_id,
                    &url,
                    status,
                    body,
                    latency.map(|d| d.as_millis() as u64),
                );
                debug!(endpoint = %endpoint, status, ok = record.ok, "monitored response");
                metrics::record_response(&endpoint, record.ok, latency);
                self.push(record);
            }
            NetworkEvent::LoadingFailed { request_id } => {
                if let Some((_, flight)) = self.inflight.remove(&request_id) {
                    let latency = flight.started.elapsed();
                    metrics::record_response(&flight.endpoint, false, Some(latency));
                    self.push(MonitoredRecord::failed(
                        &flight.endpoint,
                        &request_id,
                        &flight.url,
                        Some(latency.as_millis() as u64),
                    ));
                }
            }
        }
    }

    fn push(&self, record: MonitoredRecord) {
        let cap = self.config.max_records_per_endpoint.max(1);
        {
            let mut list = self.records.entry(record.endpoint.clone()).or_default();
            list.push(record);
            if list.len() > cap {
                let excess = list.len() - cap;
                list.drain(..excess);
            }
        }
        self.notify.notify_waiters();
    }

    fn prune_inflight(&self) {
        let ttl = Duration::from_millis(self.config.latency_ttl_ms);
        self.inflight.retain(|_, flight| flight.started.elapsed() < ttl);
    }

    fn ok_count(&self, endpoint: &str) -> usize {
        self.records
            .get(endpoint)
            .map(|list| list.iter().filter(|r| r.ok).count())
            .unwrap_or(0)
    }
}

/// Background listener lifecycle, stopped on rebind or drop.
struct ListenerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Production monitor fed by [`PageSession::subscribe_network`].
pub struct NetworkTapMonitor {
    shared: Arc<Shared>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl NetworkTapMonitor {
    pub fn new(config: TapConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                endpoints: RwLock::new(EndpointSet::new()),
                records: DashMap::new(),
                inflight: DashMap::new(),
                notify: Notify::new(),
            }),
            listener: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TapConfig {
        &self.shared.config
    }

    pub fn is_bound(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Requests currently tracked for latency.
    pub fn inflight_len(&self) -> usize {
        self.shared.inflight.len()
    }

    pub fn shutdown(&self) {
        self.listener.lock().take();
    }

    fn bind(&self, session: &dyn PageSession, endpoints: EndpointSet) -> Result<(), TapError> {
        if endpoints.is_empty() {
            return Err(TapError::EmptyEndpointSet);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TapError::NoRuntime)?;

        // Subscribe before returning so nothing the action triggers is missed.
        let rx = session.subscribe_network();
        let mut listener = self.listener.lock();
        listener.take();

        *self.shared.endpoints.write() = endpoints;
        self.shared.records.clear();
        self.shared.inflight.clear();

        let cancel = CancellationToken::new();
        let task = runtime.spawn(listen(self.shared.clone(), rx, cancel.clone()));
        *listener = Some(ListenerHandle {
            cancel,
            task: Some(task),
        });
        Ok(())
    }

    /// Wait until `check` yields a value, the deadline passes or `cancel` fires.
    async fn wait_for<T>(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
        check: impl Fn(&Shared) -> Option<T>,
    ) -> Result<Option<T>, ()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(found) = check(&self.shared) {
                return Ok(Some(found));
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(()),
                _ = tokio::time::sleep_until(deadline) => return Ok(check(&self.shared)),
                _ = &mut notified => {}
            }
        }
    }
}

impl Default for NetworkTapMonitor {
    fn default() -> Self {
        Self::new(TapConfig::default())
    }
}

async fn listen(
    shared: Arc<Shared>,
    mut rx: broadcast::Receiver<NetworkEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(event) => shared.ingest(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "network listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("network channel closed");
                    break;
                }
            },
        }
    }
}

#[async_trait]
impl ActionConfirmationMonitor for NetworkTapMonitor {
    async fn setup_monitor(&self, session: &dyn PageSession, endpoints: EndpointSet) -> bool {
        let count = endpoints.len();
        match self.bind(session, endpoints) {
            Ok(()) => {
                info!(endpoints = count, "confirmation monitor bound");
                true
            }
            Err(err) => {
                warn!(%err, "confirmation monitor bind failed");
                false
            }
        }
    }

    async fn wait_for_responses(
        &self,
        endpoint: &str,
        timeout: Duration,
        min_count: usize,
    ) -> bool {
        let never = CancellationToken::new();
        let wanted = min_count.max(1);
        matches!(
            self.wait_for(timeout, &never, |shared| {
                (shared.ok_count(endpoint) >= wanted).then_some(())
            })
            .await,
            Ok(Some(()))
        )
    }

    fn get_monitored_details(&self, endpoint: &str) -> Vec<MonitoredRecord> {
        self.shared
            .records
            .get(endpoint)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    fn clear_monitored_data(&self, endpoint: Option<&str>) {
        match endpoint {
            Some(name) => {
                self.shared.records.remove(name);
            }
            None => self.shared.records.clear(),
        }
    }

    async fn await_toggle(
        &self,
        endpoint: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ToggleOutcome {
        let opposite = self
            .shared
            .endpoints
            .read()
            .opposite_of(endpoint)
            .map(str::to_string);
        let outcome = self
            .wait_for(timeout, cancel, |shared| {
                if shared.ok_count(endpoint) > 0 {
                    return Some(ToggleOutcome::Confirmed);
                }
                match &opposite {
                    Some(opp) if shared.ok_count(opp) > 0 => Some(ToggleOutcome::OppositeFired),
                    _ => None,
                }
            })
            .await;
        match outcome {
            Ok(Some(resolved)) => resolved,
            Ok(None) => ToggleOutcome::TimedOut,
            Err(()) => ToggleOutcome::Cancelled,
        }
    }
}
