//! End-to-end bootstrap: wait for the pipeline, build the command, run the VM.

use std::fmt;

use crate::{
    Invocation, InvocationBuilder, ReadinessConfig, ReadinessWaiter, Result, RunConfig, VmProfile,
    run_hypervisor,
};

/// Orchestrator stages, in the order a run passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Stage {
    /// Polling the simulation pipeline's port.
    Waiting,
    /// Assembling the hypervisor arguments.
    Building,
    /// Spawning the hypervisor.
    Launching,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Waiting => "waiting",
            Self::Building => "building",
            Self::Launching => "launching",
        })
    }
}

/// Sequences readiness wait, argument assembly and launch for one VM.
///
/// Each stage returns a [`Result`]; the first error ends the run and is
/// handed back to the caller untouched.
#[derive(Debug, Clone, Default)]
pub struct Bootstrap {
    builder: InvocationBuilder,
    waiter: ReadinessWaiter,
}

impl Bootstrap {
    /// Creates an orchestrator for `profile` with the given readiness timing.
    pub const fn new(profile: VmProfile, readiness: ReadinessConfig) -> Self {
        Self {
            builder: InvocationBuilder::new(profile),
            waiter: ReadinessWaiter::new(readiness),
        }
    }

    /// Builds the invocation without waiting or launching.
    pub fn invocation(&self, config: &RunConfig) -> Invocation {
        tracing::debug!(stage = %Stage::Building, "entering stage");
        if let Some(path) = &config.config_path {
            tracing::info!(config = %path.display(), "sharing config folder");
        }
        let invocation = self.builder.build(config);
        tracing::info!(command = %invocation, "built hypervisor invocation");
        invocation
    }

    /// Runs the full bootstrap and returns once the hypervisor exits.
    pub async fn run(&self, config: &RunConfig) -> Result<()> {
        if let Some(port) = config.target_port {
            tracing::debug!(stage = %Stage::Waiting, port, "entering stage");
            self.waiter.wait(port).await?;
        }

        let invocation = self.invocation(config);

        tracing::debug!(stage = %Stage::Launching, "entering stage");
        run_hypervisor(&invocation).await
    }
}
