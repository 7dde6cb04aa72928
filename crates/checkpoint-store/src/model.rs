use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waymark_core_types::OperationId;

/// One durable record in an operation's checkpoint log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEnvelope {
    pub operation_id: OperationId,
    pub seq: i64,
    pub payload: serde_json::Value,
    pub ts_wall: DateTime<Utc>,
}

impl CheckpointEnvelope {
    pub fn new(operation_id: OperationId, seq: i64, payload: serde_json::Value) -> Self {
        Self {
            operation_id,
            seq,
            payload,
            ts_wall: Utc::now(),
        }
    }
}
