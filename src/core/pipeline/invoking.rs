use std::sync::Arc;
use std::time::Duration;

use crate::config::SandboxConfig;
use crate::constants::SANDBOX_GRACE_SECS;
use crate::core::domain::{RawSandboxOutput, ResourceLimits, SandboxInvocation};
use crate::core::traits::executor::{InvokeError, SandboxExecutor};

/// Assembles the nsjail command for one wrapper program.
///
/// The invocation runs the wrapper in run-once mode under the
/// configured rlimits, with every optional isolation namespace
/// disabled. Namespace isolation is traded away for portability on
/// restrictive hosts; the rlimits plus the validator's denylist are
/// the enforced boundary. The child environment is an explicit
/// whitelist rather than the caller's environment.
pub fn build_invocation(
    wrapper: &str,
    limits: &ResourceLimits,
    sandbox: &SandboxConfig,
) -> SandboxInvocation {
    let mut args: Vec<String> = vec![
        "--mode".to_string(),
        "o".to_string(),
        "--time_limit".to_string(),
        limits.time_limit_secs.to_string(),
        "--rlimit_as".to_string(),
        limits.memory_limit_mb.to_string(),
        "--rlimit_cpu".to_string(),
        limits.cpu_limit_secs.to_string(),
        "--rlimit_fsize".to_string(),
        limits.max_file_size_mb.to_string(),
        "--rlimit_nofile".to_string(),
        limits.max_open_files.to_string(),
        "--disable_clone_newuser".to_string(),
        "--disable_clone_newnet".to_string(),
        "--disable_clone_newns".to_string(),
        "--disable_clone_newpid".to_string(),
        "--disable_clone_newipc".to_string(),
        "--disable_clone_newuts".to_string(),
        "--disable_clone_newcgroup".to_string(),
        "--disable_proc".to_string(),
        "--skip_setsid".to_string(),
        "--quiet".to_string(),
    ];

    for (key, value) in sandbox_env(sandbox) {
        args.push("--env".to_string());
        args.push(format!("{key}={value}"));
    }

    args.push("--".to_string());
    args.push(sandbox.python_path.display().to_string());
    args.push("-c".to_string());
    args.push(wrapper.to_string());

    SandboxInvocation {
        program: sandbox.nsjail_path.clone(),
        args,
    }
}

fn sandbox_env(sandbox: &SandboxConfig) -> Vec<(&'static str, String)> {
    vec![
        ("HOME", "/tmp".to_string()),
        ("PATH", "/usr/local/bin:/usr/bin:/bin".to_string()),
        ("PYTHONPATH", sandbox.python_search_path.clone()),
        ("LD_LIBRARY_PATH", sandbox.ld_library_path.clone()),
    ]
}

/// Runs one wrapper program through the sandbox executor.
///
/// Waits up to the configured time limit plus a fixed grace period;
/// classifies a missing executor binary, an expired wait, and a
/// non-zero executor exit as infrastructure failures. The wrapper
/// itself always exits zero and reports user-code failures through its
/// JSON body, so a non-zero status here is never the user's program.
#[tracing::instrument(skip_all)]
pub async fn run_sandboxed(
    executor: &Arc<dyn SandboxExecutor>,
    wrapper: &str,
    limits: &ResourceLimits,
    sandbox: &SandboxConfig,
) -> Result<RawSandboxOutput, InvokeError> {
    if !sandbox.nsjail_path.exists() {
        tracing::error!(
            path = %sandbox.nsjail_path.display(),
            "sandbox executor binary not found"
        );
        return Err(InvokeError::Missing {
            path: sandbox.nsjail_path.display().to_string(),
        });
    }

    let invocation = build_invocation(wrapper, limits, sandbox);
    tracing::debug!(command = %invocation.command_line(), "invoking sandbox executor");

    let wait = Duration::from_secs(limits.time_limit_secs + SANDBOX_GRACE_SECS);
    let output = executor.invoke(&invocation, wait).await?;

    if output.status != 0 {
        tracing::error!(
            status = output.status,
            stderr = %output.stderr,
            "sandbox executor exited non-zero"
        );
        return Err(InvokeError::ExecutorFailed { output });
    }

    Ok(output)
}
