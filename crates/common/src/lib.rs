//! Shared plumbing for the stakelock binaries, currently the logging and
//! trace-export bootstrap.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
