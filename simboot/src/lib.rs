//! Bootstrap orchestrator for a simulated network-device VM.
//!
//! The device runs as a QEMU guest next to a data-plane simulation pipeline.
//! A run waits until the pipeline is listening on its TCP port, assembles the
//! hypervisor command line for the one fixed [`VmProfile`], and runs the
//! hypervisor in the foreground with inherited stdio.
//!
//! ```no_run
//! # async fn demo() -> simboot::Result<()> {
//! use simboot::{Bootstrap, RunConfig};
//!
//! let config = RunConfig::from_flags("/data/device1/init.cfg", 50000);
//! Bootstrap::default().run(&config).await
//! # }
//! ```
//!
//! # Deployment
//!
//! The guest's SSH, gNMI and P4Runtime ports are forwarded from the same
//! host ports (see [`FORWARDED_PORTS`]). Run one instance per host network
//! namespace; an outer layer is expected to spawn one process per device.

mod boot;
mod error;
mod invocation;
mod launch;
mod profile;
mod readiness;

pub use boot::{Bootstrap, Stage};
pub use error::{Error, Result};
pub use invocation::{Invocation, InvocationBuilder, RunConfig};
pub use launch::run_hypervisor;
pub use profile::{
    CONFIG_MOUNT_TAG, DEFAULT_ACCEL, DEFAULT_DISK_FORMAT, DEFAULT_DISK_IMAGE, DEFAULT_HYPERVISOR,
    DEFAULT_MEMORY_MIB, DEFAULT_VCPUS, FORWARDED_PORTS, FSDEV_ID, NETDEV_ID, VmProfile,
};
pub use readiness::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT, ReadinessConfig,
    ReadinessWaiter, wait_for_port,
};
