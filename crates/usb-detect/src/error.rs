//! Error types for device lookups

use thiserror::Error;

/// Errors that can occur while querying an information provider
///
/// These never reach the monitor: a failed lookup just means no
/// description is available.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to build the runtime that drives lookup commands
    #[error("failed to start lookup runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Command line had no program name
    #[error("empty command line")]
    EmptyCommand,

    /// Failed to spawn the lookup command
    #[error("failed to run {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    /// Lookup did not finish in time
    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },
}
