//! CLI that waits for the simulation pipeline and boots the device VM.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use simboot::{
    Bootstrap, DEFAULT_HYPERVISOR, DEFAULT_WAIT_TIMEOUT, ReadinessConfig, RunConfig, VmProfile,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "simboot",
    version,
    about = "Wait for the sim pipeline, then boot the device VM under QEMU"
)]
struct Cli {
    /// Device config file; its directory is shared into the guest over 9p.
    #[arg(long = "config_file", default_value = "")]
    config_file: String,

    /// TCP port the sim pipeline listens on. 0 skips the readiness wait.
    #[arg(long = "target_port", default_value_t = 0)]
    target_port: u16,

    /// Print the hypervisor command instead of running it.
    #[arg(long = "dry_run")]
    dry_run: bool,

    /// Output format for --dry_run.
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Hypervisor binary.
    #[arg(long, hide = true, default_value = DEFAULT_HYPERVISOR)]
    hypervisor: String,

    /// Readiness wait budget in seconds.
    #[arg(
        long = "wait_timeout",
        hide = true,
        default_value_t = DEFAULT_WAIT_TIMEOUT.as_secs()
    )]
    wait_timeout: u64,
}

/// Output format for --dry_run.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// POSIX shell command line, quoted so it can be pasted into `sh`.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    if let Err(e) = Cli::parse().run().await {
        eprintln!("simboot: {e:#}");
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the `info` default.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

impl Cli {
    async fn run(self) -> Result<()> {
        let config = RunConfig::from_flags(&self.config_file, self.target_port);
        let boot = Bootstrap::new(
            VmProfile::default().with_hypervisor(self.hypervisor),
            ReadinessConfig::default().with_timeout(Duration::from_secs(self.wait_timeout)),
        );

        if self.dry_run {
            let invocation = boot.invocation(&config);
            match self.format {
                OutputFormat::Text => println!("{invocation}"),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&invocation)?),
            }
            return Ok(());
        }

        boot.run(&config).await?;
        Ok(())
    }
}
