use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    File,
}

/// Policy snapshot consumed by [`crate::open_store`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorePolicyView {
    pub backend: StoreBackend,
    pub root: PathBuf,
    /// `sync_data` after every append.
    pub fsync: bool,
    /// Records retained per operation once a log is compacted; 0 keeps everything.
    pub max_history_per_op: usize,
}

impl Default for StorePolicyView {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            root: PathBuf::from("./waymark-checkpoints"),
            fsync: true,
            max_history_per_op: 256,
        }
    }
}
