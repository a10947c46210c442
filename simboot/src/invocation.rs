//! Hypervisor command-line assembly.
//!
//! QEMU parses its arguments as positional flag/value pairs, so token order
//! is part of the contract: hardware, then network, then the optional
//! shared folder.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::profile::{CONFIG_MOUNT_TAG, FORWARDED_PORTS, FSDEV_ID, NETDEV_ID, VmProfile};

/// Per-run inputs: the two variation points of the device VM.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Device config file. Its parent directory is shared into the guest.
    pub config_path: Option<PathBuf>,
    /// Port the simulation pipeline will listen on. `None` skips the wait.
    pub target_port: Option<u16>,
}

impl RunConfig {
    /// Builds a config from raw flag values, where `""` and `0` mean "unset".
    pub fn from_flags(config_file: &str, target_port: u16) -> Self {
        Self {
            config_path: (!config_file.is_empty()).then(|| PathBuf::from(config_file)),
            target_port: (target_port != 0).then_some(target_port),
        }
    }

    /// Directory to share into the guest, if a config file was given.
    pub fn shared_dir(&self) -> Option<PathBuf> {
        self.config_path.as_deref().map(parent_dir)
    }
}

/// Directory containing `path`, with `filepath.Dir` semantics.
///
/// A trailing separator names the directory itself (`/a/b/` is `/a/b`), a
/// bare file name resolves to `.`, and the root stays the root.
fn parent_dir(path: &Path) -> PathBuf {
    let trailing_sep = path
        .as_os_str()
        .as_encoded_bytes()
        .last()
        .is_some_and(|&b| std::path::is_separator(char::from(b)));
    if trailing_sep {
        return path.components().collect();
    }
    match path.parent() {
        Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
        Some(p) => p.to_path_buf(),
        // Only the root (or a prefix on Windows) has no parent.
        None => path.to_path_buf(),
    }
}

/// A fully assembled hypervisor command: program plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    /// The hypervisor binary.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument vector, without the program name.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            f.write_str(" ")?;
            write_quoted(f, arg)?;
        }
        Ok(())
    }
}

/// Writes `arg` as a POSIX shell word, single-quoting it unless every
/// character is shell-inert.
fn write_quoted(f: &mut fmt::Formatter<'_>, arg: &str) -> fmt::Result {
    let inert = |c: char| c.is_ascii_alphanumeric() || "-_=,.:/@%+".contains(c);
    if !arg.is_empty() && arg.chars().all(inert) {
        return f.write_str(arg);
    }
    f.write_str("'")?;
    f.write_str(&arg.replace('\'', r"'\''"))?;
    f.write_str("'")
}

/// Translates a [`RunConfig`] into an [`Invocation`] for a fixed profile.
///
/// Building is pure: the same profile and config always produce the same
/// tokens, and nothing on the filesystem is touched or validated.
#[derive(Debug, Clone, Default)]
pub struct InvocationBuilder {
    profile: VmProfile,
}

impl InvocationBuilder {
    /// Creates a builder for the given profile.
    pub const fn new(profile: VmProfile) -> Self {
        Self { profile }
    }

    /// The profile this builder renders.
    pub const fn profile(&self) -> &VmProfile {
        &self.profile
    }

    /// Assembles the argument list for one run.
    pub fn build(&self, config: &RunConfig) -> Invocation {
        let mut args = Vec::with_capacity(18);
        self.push_hardware(&mut args);
        push_network(&mut args);
        if let Some(dir) = config.shared_dir() {
            push_shared_folder(&mut args, &dir);
        }
        Invocation {
            program: self.profile.hypervisor.clone(),
            args,
        }
    }

    /// Display, accelerator, memory, CPUs, console and OS disk.
    fn push_hardware(&self, args: &mut Vec<String>) {
        let p = &self.profile;
        args.extend([
            "-display".to_owned(),
            "none".to_owned(),
            "-accel".to_owned(),
            p.accel.clone(),
            "-m".to_owned(),
            p.memory_mib.to_string(),
            "-smp".to_owned(),
            p.vcpus.to_string(),
            "-nographic".to_owned(),
            "-drive".to_owned(),
            format!("file={},format={}", p.disk_image.display(), p.disk_format),
        ]);
    }
}

/// User-mode backend with the fixed host forwards, then the virtio NIC.
fn push_network(args: &mut Vec<String>) {
    let mut netdev = String::from("user");
    for port in FORWARDED_PORTS {
        netdev.push_str(&format!(",hostfwd=tcp::{port}-:{port}"));
    }
    netdev.push_str(&format!(",id={NETDEV_ID}"));

    args.extend([
        "-netdev".to_owned(),
        netdev,
        "-device".to_owned(),
        format!("virtio-net,netdev={NETDEV_ID}"),
    ]);
}

/// 9p backend rooted at `dir`, then the virtio-9p device carrying the mount tag.
fn push_shared_folder(args: &mut Vec<String>, dir: &Path) {
    args.extend([
        "-fsdev".to_owned(),
        format!(
            "local,security_model=none,id={FSDEV_ID},path={}",
            dir.display()
        ),
        "-device".to_owned(),
        format!("virtio-9p-pci,fsdev={FSDEV_ID},mount_tag={CONFIG_MOUNT_TAG}"),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &[&str] = &[
        "-display",
        "none",
        "-accel",
        "kvm",
        "-m",
        "32768",
        "-smp",
        "12",
        "-nographic",
        "-drive",
        "file=/vm.img,format=qcow2",
    ];

    const NETWORK: &[&str] = &[
        "-netdev",
        "user,hostfwd=tcp::22-:22,hostfwd=tcp::9339-:9339,hostfwd=tcp::9559-:9559,id=mgmt",
        "-device",
        "virtio-net,netdev=mgmt",
    ];

    fn build(config_file: &str) -> Invocation {
        InvocationBuilder::default().build(&RunConfig::from_flags(config_file, 0))
    }

    #[test]
    fn no_config_is_base_then_network() {
        let inv = build("");
        let expected: Vec<&str> = BASE.iter().chain(NETWORK).copied().collect();
        assert_eq!(inv.args(), expected.as_slice());
        assert_eq!(inv.program(), "qemu-system-x86_64");
    }

    #[test]
    fn config_appends_shared_folder_from_parent_dir() {
        let inv = build("/data/device1/init.cfg");
        let args = inv.args();
        let tail = &args[BASE.len() + NETWORK.len()..];
        assert_eq!(
            tail,
            [
                "-fsdev",
                "local,security_model=none,id=fsdev0,path=/data/device1",
                "-device",
                "virtio-9p-pci,fsdev=fsdev0,mount_tag=configfolder",
            ]
        );
        assert!(!args.iter().any(|a| a.contains("init.cfg")));
    }

    #[test]
    fn shared_folder_leaves_other_tokens_untouched() {
        let with = build("/data/device1/init.cfg");
        let without = build("");
        assert_eq!(&with.args()[..without.args().len()], without.args());
        assert_eq!(with.args().len(), without.args().len() + 4);
        assert_eq!(with.args().iter().filter(|a| *a == "-fsdev").count(), 1);
    }

    #[test]
    fn build_is_deterministic() {
        let builder = InvocationBuilder::default();
        for cfg in [
            RunConfig::from_flags("", 0),
            RunConfig::from_flags("/etc/dev/a.cfg", 50000),
        ] {
            assert_eq!(builder.build(&cfg), builder.build(&cfg));
        }
    }

    #[test]
    fn groups_are_ordered() {
        let inv = build("/cfg/x.json");
        let pos = |flag: &str| inv.args().iter().position(|a| a == flag).unwrap();
        assert!(pos("-drive") < pos("-netdev"));
        assert!(pos("-netdev") < pos("-fsdev"));
    }

    #[test]
    fn target_port_does_not_change_args() {
        let builder = InvocationBuilder::default();
        assert_eq!(
            builder.build(&RunConfig::from_flags("/a/b.cfg", 0)),
            builder.build(&RunConfig::from_flags("/a/b.cfg", 50000)),
        );
    }

    #[test]
    fn bare_file_name_shares_cwd() {
        let cfg = RunConfig::from_flags("init.cfg", 0);
        assert_eq!(cfg.shared_dir(), Some(PathBuf::from(".")));
    }

    #[test]
    fn trailing_slash_shares_named_dir() {
        let cfg = RunConfig::from_flags("/data/device1/", 0);
        assert_eq!(cfg.shared_dir(), Some(PathBuf::from("/data/device1")));
        assert_eq!(
            RunConfig::from_flags("/data/device1//", 0).shared_dir(),
            Some(PathBuf::from("/data/device1"))
        );
        assert_eq!(
            RunConfig::from_flags("/", 0).shared_dir(),
            Some(PathBuf::from("/"))
        );
    }

    #[test]
    fn flag_sentinels_mean_unset() {
        let cfg = RunConfig::from_flags("", 0);
        assert_eq!(cfg, RunConfig::default());
        let cfg = RunConfig::from_flags("/x/y", 50000);
        assert_eq!(cfg.target_port, Some(50000));
        assert_eq!(cfg.shared_dir(), Some(PathBuf::from("/x")));
    }

    #[test]
    fn profile_fields_flow_into_args() {
        let mut profile = VmProfile::default().with_hypervisor("qemu-kvm");
        profile.vcpus = 2;
        profile.memory_mib = 1024;
        let inv = InvocationBuilder::new(profile).build(&RunConfig::default());
        assert_eq!(inv.program(), "qemu-kvm");
        assert_eq!(&inv.args()[4..8], ["-m", "1024", "-smp", "2"]);
    }

    #[test]
    fn display_quotes_whitespace() {
        let inv = build("/my configs/init.cfg");
        let line = inv.to_string();
        assert!(line.starts_with("qemu-system-x86_64 -display none"));
        assert!(line.contains("'local,security_model=none,id=fsdev0,path=/my configs'"));
    }

    #[test]
    fn display_escapes_shell_metacharacters() {
        let line = build("/it's/$HOME;rm/init.cfg").to_string();
        assert!(line.ends_with(concat!(
            r"-fsdev 'local,security_model=none,id=fsdev0,path=/it'\''s/$HOME;rm' ",
            "-device virtio-9p-pci,fsdev=fsdev0,mount_tag=configfolder",
        )));
    }
}
