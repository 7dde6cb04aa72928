//! Action confirmation from network traffic.
//!
//! A [`NetworkTapMonitor`] binds to a page's network events for a set of
//! logical endpoints, normalises matching responses into
//! [`MonitoredRecord`]s and lets the caller wait for the response that proves
//! an action took effect server-side.

pub mod config;
pub mod endpoint;
pub mod errors;
pub mod metrics;
pub mod monitor;
pub mod record;
pub mod tap;

pub use config::TapConfig;
pub use endpoint::{EndpointRule, EndpointSet};
pub use errors::TapError;
pub use monitor::{ActionConfirmationMonitor, ToggleOutcome};
pub use record::MonitoredRecord;
pub use tap::NetworkTapMonitor;
