//! Hypervisor subprocess execution.

use std::process::Stdio;

use tokio::process::Command;

use crate::{Error, Invocation, Result};

/// Runs the hypervisor in the foreground and waits for it to exit.
///
/// stdin, stdout and stderr are inherited so the guest console is live on
/// the caller's terminal. There is no timeout once the VM is running.
pub async fn run_hypervisor(invocation: &Invocation) -> Result<()> {
    let program = invocation.program();
    let launch_err = |source| Error::Launch {
        program: program.to_owned(),
        source,
    };

    let mut child = Command::new(program)
        .args(invocation.args())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(launch_err)?;

    tracing::info!(program, pid = ?child.id(), "hypervisor started");

    let status = child.wait().await.map_err(launch_err)?;
    if status.success() {
        tracing::info!(program, "hypervisor exited cleanly");
        Ok(())
    } else {
        Err(Error::Exit {
            program: program.to_owned(),
            status,
        })
    }
}
