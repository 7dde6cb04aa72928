use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use waymark_core_types::PageSession;

use crate::endpoint::EndpointSet;
use crate::record::MonitoredRecord;

/// Resolution of a toggle-style confirmation wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Confirmed,
    /// The logical opposite responded instead: the target was already in
    /// the requested state and the click flipped it back.
    OppositeFired,
    TimedOut,
    Cancelled,
}

#[async_trait]
pub trait ActionConfirmationMonitor: Send + Sync {
    /// Bind listeners for `endpoints`. Must run before the triggering action.
    async fn setup_monitor(&self, session: &dyn PageSession, endpoints: EndpointSet) -> bool;

    /// Wait until `endpoint` has at least `min_count` successful records.
    async fn wait_for_responses(&self, endpoint: &str, timeout: Duration, min_count: usize)
        -> bool;

    fn get_monitored_details(&self, endpoint: &str) -> Vec<MonitoredRecord>;

    /// Drop records for one endpoint, or for all when `None`.
    fn clear_monitored_data(&self, endpoint: Option<&str>);

    async fn await_toggle(
        &self,
        endpoint: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ToggleOutcome;
}
