//! Immutable workflow progress snapshot.

use serde::{Deserialize, Serialize};

use crate::digest::DigestSet;
use crate::errors::StageError;
use crate::stage::Stage;

/// Progress of one operation at a stage boundary.
///
/// Values are never mutated in place: every transition goes through
/// [`StageCheckpoint::builder`], which copies the snapshot, applies the
/// overrides and re-derives `completed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageCheckpoint {
    step: u32,
    attempt: u32,
    stage: Stage,
    target_max: u32,
    aggregated: u32,
    last_batch: u32,
    processed: DigestSet,
    #[serde(default)]
    cursor: Option<String>,
    completed: bool,
    #[serde(default)]
    last_error: Option<StageError>,
    max_attempts: u32,
}

impl StageCheckpoint {
    pub fn create_initial(target_max: u32, max_attempts: u32, digest_cap: usize) -> Self {
        StageCheckpointBuilder {
            inner: StageCheckpoint {
                step: 0,
                attempt: 0,
                stage: Stage::Init,
                target_max,
                aggregated: 0,
                last_batch: 0,
                processed: DigestSet::new(digest_cap),
                cursor: None,
                completed: false,
                last_error: None,
                max_attempts,
            },
        }
        .build()
    }

    /// Decode a persisted payload, re-deriving the invariants.
    pub fn from_payload(payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        let decoded: StageCheckpoint = serde_json::from_value(payload)?;
        Ok(decoded.builder().build())
    }

    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn builder(&self) -> StageCheckpointBuilder {
        StageCheckpointBuilder {
            inner: self.clone(),
        }
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn target_max(&self) -> u32 {
        self.target_max
    }

    pub fn aggregated(&self) -> u32 {
        self.aggregated
    }

    pub fn last_batch(&self) -> u32 {
        self.last_batch
    }

    pub fn processed(&self) -> &DigestSet {
        &self.processed
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Terminal: the target was reached or the attempt budget is spent.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// The target was actually reached.
    pub fn succeeded(&self) -> bool {
        self.aggregated >= self.target_max
    }

    pub fn last_error(&self) -> Option<&StageError> {
        self.last_error.as_ref()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Copy-and-override builder for [`StageCheckpoint`].
#[derive(Clone, Debug)]
pub struct StageCheckpointBuilder {
    inner: StageCheckpoint,
}

impl StageCheckpointBuilder {
    pub fn step(mut self, step: u32) -> Self {
        self.inner.step = step;
        self
    }

    pub fn attempt(mut self, attempt: u32) -> Self {
        self.inner.attempt = attempt;
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.inner.stage = stage;
        self
    }

    pub fn aggregated(mut self, aggregated: u32) -> Self {
        self.inner.aggregated = aggregated;
        self
    }

    pub fn last_batch(mut self, last_batch: u32) -> Self {
        self.inner.last_batch = last_batch;
        self
    }

    pub fn processed(mut self, processed: DigestSet) -> Self {
        self.inner.processed = processed;
        self
    }

    pub fn cursor(mut self, cursor: Option<String>) -> Self {
        self.inner.cursor = cursor;
        self
    }

    pub fn last_error(mut self, last_error: Option<StageError>) -> Self {
        self.inner.last_error = last_error;
        self
    }

    pub fn build(self) -> StageCheckpoint {
        let mut checkpoint = self.inner;
        checkpoint.aggregated = checkpoint.aggregated.min(checkpoint.target_max);
        checkpoint.completed = checkpoint.aggregated >= checkpoint.target_max
            || checkpoint.attempt >= checkpoint.max_attempts;
        checkpoint
    }
}
