use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use waymark_core_types::{ElementHandle, OperationId, PageId};

/// Execution context delivered by the workflow engine.
#[derive(Clone, Debug)]
pub struct ExecCtx {
    pub operation_id: OperationId,
    pub page: PageId,
    pub cancel: CancellationToken,
}

impl ExecCtx {
    pub fn new(operation_id: OperationId, page: PageId, cancel: CancellationToken) -> Self {
        Self {
            operation_id,
            page,
            cancel,
        }
    }
}

/// Parameters for executing a click.
#[derive(Clone, Debug)]
pub struct ClickParams {
    pub element: ElementHandle,
    /// Coarse control label for logs and metrics (`like_button`), never page text.
    pub label: String,
}

impl ClickParams {
    pub fn new(element: ElementHandle, label: impl Into<String>) -> Self {
        Self {
            element,
            label: label.into(),
        }
    }
}

/// Click tiers, tried strictly in this order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickTier {
    Regular,
    Scripted,
    Coordinate,
}

impl ClickTier {
    pub const ORDER: [ClickTier; 3] = [ClickTier::Regular, ClickTier::Scripted, ClickTier::Coordinate];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClickTier::Regular => "regular",
            ClickTier::Scripted => "scripted",
            ClickTier::Coordinate => "coordinate",
        }
    }
}

/// Semantic state reported by the DOM-state inspector.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DomState {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub busy: bool,
}

/// Diagnostic clickability signals. `None` means the probe could not tell.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAssessment {
    pub in_viewport: Option<bool>,
    pub visible_by_style: Option<bool>,
    pub pointer_events: Option<bool>,
    pub unobstructed: Option<bool>,
}

impl PhysicalAssessment {
    /// True unless some probe positively reported a blocker.
    pub fn likely_clickable(&self) -> bool {
        [
            self.in_viewport,
            self.visible_by_style,
            self.pointer_events,
            self.unobstructed,
        ]
        .into_iter()
        .all(|signal| signal != Some(false))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    pub steps: usize,
    pub total_ms: u64,
    pub max_step_px: f64,
    pub mean_step_px: f64,
    pub hotspots: usize,
}

/// Outcome of a successful click.
#[derive(Clone, Debug)]
pub struct ClickReport {
    pub tier: ClickTier,
    /// Tiers actually attempted, including the successful one.
    pub attempts: u32,
    pub dom: DomState,
    pub physical: PhysicalAssessment,
    pub trajectory: Option<TrajectorySummary>,
    pub started_at: Instant,
    pub latency_ms: u128,
}
