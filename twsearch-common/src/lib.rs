//! Shared plumbing for the twsearch crates.
//!
//! At the moment this is only the [`observability`] module, which owns the
//! process-wide `tracing` subscriber used by the CLI and the integration tests.
pub mod observability;

pub use observability::{init_logging, LogConfig, LogFormat};
