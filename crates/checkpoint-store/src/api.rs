use std::sync::Arc;

use async_trait::async_trait;
use waymark_core_types::OperationId;

use crate::config::{StoreBackend, StorePolicyView};
use crate::errors::StoreError;
use crate::file::FileCheckpointStore;
use crate::memory::InMemoryCheckpointStore;
use crate::model::CheckpointEnvelope;

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable, append-only checkpoint log.
///
/// One writer per operation id is assumed. Distinct ids live in independent
/// keyspaces and may be written concurrently. I/O failures are returned to
/// the caller untouched.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Append a record. `seq` must be strictly above every stored seq for the id.
    async fn save(&self, envelope: CheckpointEnvelope) -> StoreResult<()>;

    /// Highest-seq record for the id, if any.
    async fn load_latest(&self, operation: &OperationId)
        -> StoreResult<Option<CheckpointEnvelope>>;

    /// Purge the whole history of the id.
    async fn delete(&self, operation: &OperationId) -> StoreResult<()>;

    /// Latest record per id whose id starts with `prefix`, newest first.
    async fn list_latest(&self, prefix: &str, top_n: usize)
        -> StoreResult<Vec<CheckpointEnvelope>>;
}

pub fn open_store(policy: &StorePolicyView) -> StoreResult<Arc<dyn CheckpointStore>> {
    match policy.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryCheckpointStore::new(
            policy.max_history_per_op,
        ))),
        StoreBackend::File => Ok(Arc::new(FileCheckpointStore::open(
            &policy.root,
            policy.fsync,
            policy.max_history_per_op,
        )?)),
    }
}

/// Newest-first ordering shared by the backends' `list_latest`.
pub(crate) fn rank_latest(mut latest: Vec<CheckpointEnvelope>, top_n: usize) -> Vec<CheckpointEnvelope> {
    latest.sort_by(|a, b| {
        b.ts_wall
            .cmp(&a.ts_wall)
            .then_with(|| a.operation_id.cmp(&b.operation_id))
    });
    latest.truncate(top_n);
    latest
}
