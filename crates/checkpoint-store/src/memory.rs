use async_trait::async_trait;
use dashmap::DashMap;
use waymark_core_types::OperationId;

use crate::api::{rank_latest, CheckpointStore, StoreResult};
use crate::errors::StoreErrorKind;
use crate::metrics;
use crate::model::CheckpointEnvelope;

/// Process-local checkpoint log. Same ordering rules as the file backend.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    logs: DashMap<OperationId, Vec<CheckpointEnvelope>>,
    max_history: usize,
}

impl InMemoryCheckpointStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            logs: DashMap::new(),
            max_history,
        }
    }

    /// Number of records currently retained for the id.
    pub fn history_len(&self, operation: &OperationId) -> usize {
        self.logs.get(operation).map(|log| log.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, envelope: CheckpointEnvelope) -> StoreResult<()> {
        let mut log = self.logs.entry(envelope.operation_id.clone()).or_default();
        if let Some(last) = log.last() {
            if envelope.seq <= last.seq {
                metrics::record_save(false);
                return Err(StoreErrorKind::StaleSeq {
                    operation: envelope.operation_id.0.clone(),
                    seq: envelope.seq,
                    last: last.seq,
                }
                .into());
            }
        }
        log.push(envelope);
        if self.max_history > 0 && log.len() > self.max_history {
            let excess = log.len() - self.max_history;
            log.drain(..excess);
        }
        metrics::record_save(true);
        Ok(())
    }

    async fn load_latest(
        &self,
        operation: &OperationId,
    ) -> StoreResult<Option<CheckpointEnvelope>> {
        metrics::record_load();
        Ok(self.logs.get(operation).and_then(|log| {
            log.iter().max_by_key(|env| env.seq).cloned()
        }))
    }

    async fn delete(&self, operation: &OperationId) -> StoreResult<()> {
        self.logs.remove(operation);
        Ok(())
    }

    async fn list_latest(
        &self,
        prefix: &str,
        top_n: usize,
    ) -> StoreResult<Vec<CheckpointEnvelope>> {
        let latest = self
            .logs
            .iter()
            .filter(|entry| entry.key().as_str().starts_with(prefix))
            .filter_map(|entry| entry.value().iter().max_by_key(|env| env.seq).cloned())
            .collect();
        Ok(rank_latest(latest, top_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(op: &str, seq: i64) -> CheckpointEnvelope {
        CheckpointEnvelope::new(OperationId::new(op), seq, json!({ "seq": seq }))
    }

    #[tokio::test]
    async fn load_latest_returns_max_seq() {
        let store = InMemoryCheckpointStore::new(0);
        for seq in [1, 2, 5, 9] {
            store.save(env("op", seq)).await.unwrap();
        }
        let latest = store
            .load_latest(&OperationId::new("op"))
            .await
            .unwrap()
            .expect("latest");
        assert_eq!(latest.seq, 9);
        assert_eq!(latest.payload, json!({ "seq": 9 }));
    }

    #[tokio::test]
    async fn rejects_non_increasing_seq() {
        let store = InMemoryCheckpointStore::new(0);
        store.save(env("op", 3)).await.unwrap();
        let err = store.save(env("op", 3)).await.unwrap_err();
        assert!(matches!(err.kind(), StoreErrorKind::StaleSeq { last: 3, .. }));
        // a different id has its own keyspace
        store.save(env("other", 1)).await.unwrap();
    }

    #[tokio::test]
    async fn history_is_trimmed_but_latest_survives() {
        let store = InMemoryCheckpointStore::new(3);
        for seq in 1..=10 {
            store.save(env("op", seq)).await.unwrap();
        }
        let op = OperationId::new("op");
        assert_eq!(store.history_len(&op), 3);
        assert_eq!(store.load_latest(&op).await.unwrap().unwrap().seq, 10);
    }

    #[tokio::test]
    async fn delete_and_list_latest() {
        let store = InMemoryCheckpointStore::new(0);
        store.save(env("search:a", 1)).await.unwrap();
        store.save(env("search:a", 2)).await.unwrap();
        store.save(env("search:b", 1)).await.unwrap();
        store.save(env("like:c", 1)).await.unwrap();

        let listed = store.list_latest("search:", 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        let a = listed
            .iter()
            .find(|env| env.operation_id.as_str() == "search:a")
            .unwrap();
        assert_eq!(a.seq, 2);

        store.delete(&OperationId::new("search:a")).await.unwrap();
        assert!(store
            .load_latest(&OperationId::new("search:a"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.list_latest("", 1).await.unwrap().len(), 1);
    }
}
