//! Resumable workflow engine.
//!
//! An [`OperationStateMachine`] drives one [`Workflow`] flavor through a fixed
//! stage sequence per attempt, writing a [`StageCheckpoint`] to the
//! checkpoint log after every stage so a killed process resumes where it
//! stopped.

pub mod checkpoint;
pub mod config;
pub mod digest;
pub mod engine;
pub mod errors;
pub mod guard;
pub mod metrics;
pub mod stage;
pub mod workflow;

pub use checkpoint::{StageCheckpoint, StageCheckpointBuilder};
pub use config::FlowConfig;
pub use digest::{digest_of, fnv1a64, DigestSet};
pub use engine::{
    Bound, OperationStateMachine, OperationStateMachineBuilder, RunContext, RunOutcome,
};
pub use errors::{FlowError, StageError};
pub use guard::{PageGuard, UrlPageGuard};
pub use stage::Stage;
pub use workflow::{
    ActStep, Confirmation, InteractWorkflow, ItemExtractor, ScrollAggregateWorkflow,
    SearchWorkflow, Workflow,
};
