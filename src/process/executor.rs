use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::core::domain::{RawSandboxOutput, SandboxInvocation};
use crate::core::traits::executor::{InvokeError, SandboxExecutor};

/// Production [`SandboxExecutor`]: spawns the invocation as a child
/// process and collects its output within the wall-clock bound.
///
/// `kill_on_drop` guarantees the child is reaped when the wait expires,
/// so a timed-out sandbox process is not left running.
#[derive(Clone, Debug, Default)]
pub struct ProcessExecutor;

#[async_trait::async_trait]
impl SandboxExecutor for ProcessExecutor {
    async fn invoke(
        &self,
        invocation: &SandboxInvocation,
        wait: Duration,
    ) -> Result<RawSandboxOutput, InvokeError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => InvokeError::Missing {
                path: invocation.program.display().to_string(),
            },
            _ => InvokeError::FailedToLaunch {
                msg: format!("Failed to spawn process: {e}"),
            },
        })?;

        let output = match timeout(wait, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| InvokeError::FailedToLaunch {
                msg: format!("Failed to wait for process: {e}"),
            })?,
            Err(_) => return Err(InvokeError::TimedOut),
        };

        Ok(RawSandboxOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Best-effort `--version` probe of the sandbox executor binary,
/// logged once at startup for diagnostics.
pub async fn probe_version(path: &Path) -> Option<String> {
    let probe = Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = timeout(Duration::from_secs(2), probe).await.ok()?.ok()?;
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}
