//! The fixed VM profile for the simulated device.
//!
//! There is exactly one profile. Its values are exposed as named constants so
//! tests and operators can swap single fields (usually the hypervisor binary)
//! without touching production defaults.

use std::path::PathBuf;

/// Hypervisor binary, resolved on `PATH`.
pub const DEFAULT_HYPERVISOR: &str = "qemu-system-x86_64";

/// Hardware accelerator.
pub const DEFAULT_ACCEL: &str = "kvm";

/// Guest RAM in MiB (32 GiB).
pub const DEFAULT_MEMORY_MIB: u32 = 32 * 1024;

/// Number of virtual CPUs.
pub const DEFAULT_VCPUS: u8 = 12;

/// Guest OS disk image.
pub const DEFAULT_DISK_IMAGE: &str = "/vm.img";

/// On-disk format of [`DEFAULT_DISK_IMAGE`].
pub const DEFAULT_DISK_FORMAT: &str = "qcow2";

/// Host ports forwarded to the same guest port: SSH, gNMI and P4Runtime.
///
/// Because these are bound on the host, only one VM can run per network
/// namespace.
pub const FORWARDED_PORTS: [u16; 3] = [22, 9339, 9559];

/// Identifier of the user-mode network backend.
pub const NETDEV_ID: &str = "mgmt";

/// Identifier of the shared-folder backend.
pub const FSDEV_ID: &str = "fsdev0";

/// 9p mount tag the guest uses to find the config folder.
pub const CONFIG_MOUNT_TAG: &str = "configfolder";

/// Hardware and disk settings for the device VM.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmProfile {
    /// Hypervisor binary name or path. Defaults to [`DEFAULT_HYPERVISOR`].
    pub hypervisor: String,
    /// Accelerator passed to `-accel`. Defaults to [`DEFAULT_ACCEL`].
    pub accel: String,
    /// RAM in MiB. Defaults to [`DEFAULT_MEMORY_MIB`].
    pub memory_mib: u32,
    /// vCPU count. Defaults to [`DEFAULT_VCPUS`].
    pub vcpus: u8,
    /// Disk image path. Defaults to [`DEFAULT_DISK_IMAGE`].
    pub disk_image: PathBuf,
    /// Disk image format. Defaults to [`DEFAULT_DISK_FORMAT`].
    pub disk_format: String,
}

impl Default for VmProfile {
    fn default() -> Self {
        Self {
            hypervisor: DEFAULT_HYPERVISOR.to_owned(),
            accel: DEFAULT_ACCEL.to_owned(),
            memory_mib: DEFAULT_MEMORY_MIB,
            vcpus: DEFAULT_VCPUS,
            disk_image: PathBuf::from(DEFAULT_DISK_IMAGE),
            disk_format: DEFAULT_DISK_FORMAT.to_owned(),
        }
    }
}

impl VmProfile {
    /// Replaces the hypervisor binary.
    #[must_use]
    pub fn with_hypervisor(mut self, hypervisor: impl Into<String>) -> Self {
        self.hypervisor = hypervisor.into();
        self
    }
}
