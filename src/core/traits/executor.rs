use std::time::Duration;

use crate::core::domain::{RawSandboxOutput, SandboxInvocation};

/// Narrow capability boundary to the external sandbox executor.
///
/// The executor is a black box: the entire observable surface back from
/// it is the exit status and the two raw byte streams. Implementations
/// must spawn exactly one child process per call and leave no residual
/// state behind, whether the call succeeds or fails.
#[mockall::automock]
#[async_trait::async_trait]
pub trait SandboxExecutor: Send + Sync {
    /// Runs one assembled invocation, waiting at most `wait` wall clock.
    async fn invoke(
        &self,
        invocation: &SandboxInvocation,
        wait: Duration,
    ) -> Result<RawSandboxOutput, InvokeError>;
}

/// Infrastructure-level failures of a sandbox invocation. These are
/// distinct from user-code errors, which the wrapper always reports
/// through its JSON body with a zero exit status.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    #[error("nsjail binary not found")]
    Missing { path: String },

    #[error("Code execution timed out")]
    TimedOut,

    #[error("Code execution failed in sandbox")]
    ExecutorFailed { output: RawSandboxOutput },

    #[error("Failed to launch sandbox executor: {msg}")]
    FailedToLaunch { msg: String },
}
