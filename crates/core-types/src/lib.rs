//! Shared primitives for the waymark crates.
//!
//! Identifiers, geometry, the failure taxonomy shared by every stage, and the
//! browser session contract consumed (never implemented) by the core.

pub mod session;
#[cfg(feature = "testing")]
pub mod testing;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use session::{ElementHandle, NetworkEvent, PageSession};

/// Coarse failure classes. The label doubles as a low-cardinality metric label.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ContextNotReady,
    ElementNotFound,
    MonitorBindFailed,
    ConfirmationTimeout,
    /// A confirmation arrived but did not show the expected effect.
    ConfirmationRejected,
    AmbiguousOppositeSignal,
    ClickExhausted,
    TargetDisabled,
    EvaluationDenied,
    StoreIoFailure,
    Cancelled,
    Session,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::ContextNotReady => "context_not_ready",
            FailureKind::ElementNotFound => "element_not_found",
            FailureKind::MonitorBindFailed => "monitor_bind_failed",
            FailureKind::ConfirmationTimeout => "confirmation_timeout",
            FailureKind::ConfirmationRejected => "confirmation_rejected",
            FailureKind::AmbiguousOppositeSignal => "ambiguous_opposite_signal",
            FailureKind::ClickExhausted => "click_exhausted",
            FailureKind::TargetDisabled => "target_disabled",
            FailureKind::EvaluationDenied => "evaluation_denied",
            FailureKind::StoreIoFailure => "store_io_failure",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Session => "session",
        }
    }

    /// Failures that a later attempt can reasonably clear on its own.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::ConfirmationTimeout | FailureKind::Session | FailureKind::ClickExhausted
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared error type passed between the crates of the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DriveError {
    pub kind: FailureKind,
    pub message: String,
}

impl DriveError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Error raised by the session collaborator itself.
    pub fn session(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Session, message)
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "operation cancelled")
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub String);

impl OperationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PageId(pub String);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Viewport-relative pointer position in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
