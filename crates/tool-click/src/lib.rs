pub mod api;
pub mod errors;
pub mod gate;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod ports;

mod physical;
mod precheck;
mod runner;

pub use api::{ClickPolicy, HumanClickPolicy, HumanClickPolicyBuilder};
pub use errors::ClickError;
pub use gate::ScriptEvaluationGate;
pub use model::{ClickParams, ClickReport, ClickTier, DomState, ExecCtx, PhysicalAssessment};
pub use policy::ClickPolicyView;
pub use ports::{DomStateInspector, ScriptedDomInspector};
