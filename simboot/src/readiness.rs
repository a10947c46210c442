//! Readiness wait for the data-plane simulation pipeline.
//!
//! The pipeline signals readiness by opening a TCP listener. A completed
//! handshake on `localhost:<port>` is the whole signal; no bytes are
//! exchanged and the connection is dropped straight away.

use std::io;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::{Error, Result};

/// Overall budget for the pipeline to come up.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(180);

/// Upper bound on a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause between failed attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timing knobs for [`ReadinessWaiter`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Overall deadline, measured from the first attempt.
    pub timeout: Duration,
    /// Per-attempt connect timeout.
    pub connect_timeout: Duration,
    /// Sleep between attempts.
    pub poll_interval: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ReadinessConfig {
    /// Replaces the overall deadline, keeping the polling cadence.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces both the per-attempt connect timeout and the poll interval.
    #[must_use]
    pub const fn with_cadence(mut self, connect_timeout: Duration, poll_interval: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.poll_interval = poll_interval;
        self
    }
}

/// Polls a local TCP port until it accepts a connection or the deadline passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadinessWaiter {
    config: ReadinessConfig,
}

impl ReadinessWaiter {
    /// Creates a waiter with the given timing.
    pub const fn new(config: ReadinessConfig) -> Self {
        Self { config }
    }

    /// The timing this waiter uses.
    pub const fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Blocks until `localhost:port` accepts a TCP connection.
    ///
    /// Port `0` means no readiness check was requested and returns at once.
    /// Fails with [`Error::Timeout`] once the deadline has passed without a
    /// successful connect; there is no retry beyond that.
    pub async fn wait(&self, port: u16) -> Result<()> {
        if port == 0 {
            tracing::debug!("no target port, skipping readiness wait");
            return Ok(());
        }

        let start = Instant::now();
        let deadline = start + self.config.timeout;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            tracing::info!(port, attempt, "waiting for sim pipeline to listen");

            match probe(port, self.config.connect_timeout).await {
                Ok(()) => {
                    tracing::debug!(
                        port,
                        attempt,
                        elapsed = ?start.elapsed(),
                        "sim pipeline is listening"
                    );
                    return Ok(());
                }
                Err(e) => tracing::debug!(port, attempt, error = %e, "probe failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Timeout {
                    port,
                    timeout: self.config.timeout,
                });
            }
            tokio::time::sleep(self.config.poll_interval.min(deadline - now)).await;
        }
    }
}

/// Waits for `port` with the default polling cadence and the given deadline.
pub async fn wait_for_port(port: u16, timeout: Duration) -> Result<()> {
    ReadinessWaiter::new(ReadinessConfig::default().with_timeout(timeout))
        .wait(port)
        .await
}

/// One connect attempt. The stream is dropped (closed) on success.
async fn probe(port: u16, connect_timeout: Duration) -> io::Result<()> {
    match tokio::time::timeout(connect_timeout, TcpStream::connect(("localhost", port))).await {
        Ok(stream) => stream.map(drop),
        Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")),
    }
}
