//! Waymark command line support.
//!
//! Configuration loading, logging setup, the process-wide metrics registry
//! and the checkpoint diagnostics commands behind the `waymark` binary.

pub mod cli;
pub mod config;
pub mod metrics;

pub use config::AppConfig;
