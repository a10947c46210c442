//! Error types for simboot operations.

use std::process::ExitStatus;
use std::time::Duration;

/// Alias for `Result<T, simboot::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the bootstrap stages.
///
/// Every variant is fatal to the orchestrator; the binary is the only place
/// that turns one into a process exit.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The simulation pipeline never opened its port before the deadline.
    #[error("timed out after {timeout:?} waiting for the simulation pipeline on port {port}")]
    Timeout {
        /// The port that was probed.
        port: u16,
        /// The overall wait budget that elapsed.
        timeout: Duration,
    },

    /// The hypervisor process could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// The hypervisor binary name.
        program: String,
        /// The OS error from spawn or wait.
        #[source]
        source: std::io::Error,
    },

    /// The hypervisor ran but exited nonzero or was killed by a signal.
    #[error("{program} exited abnormally: {status}")]
    Exit {
        /// The hypervisor binary name.
        program: String,
        /// The exit status reported by the OS.
        status: ExitStatus,
    },
}
