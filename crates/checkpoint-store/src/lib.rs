pub mod api;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod model;

mod file;
mod memory;
mod naming;

pub use api::{open_store, CheckpointStore, StoreResult};
pub use config::{StoreBackend, StorePolicyView};
pub use errors::{StoreError, StoreErrorKind};
pub use file::FileCheckpointStore;
pub use memory::InMemoryCheckpointStore;
pub use model::CheckpointEnvelope;
