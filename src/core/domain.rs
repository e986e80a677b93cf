use std::path::PathBuf;

use itertools::Itertools;
use serde_json::Value;

/// Resource ceilings applied to every sandboxed execution.
///
/// Built once from the process configuration at startup and shared
/// read-only across requests; there is no per-request tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceLimits {
    pub time_limit_secs: u64,
    pub memory_limit_mb: u64,
    pub cpu_limit_secs: u64,
    pub max_file_size_mb: u64,
    pub max_open_files: u64,
}

/// A fully assembled sandbox executor command.
///
/// Constructed fresh per request, determined entirely by the resource
/// limits and the wrapper program text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SandboxInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl SandboxInvocation {
    pub fn command_line(&self) -> String {
        format!("{} {}", self.program.display(), self.args.iter().join(" "))
    }
}

/// Raw observable surface of one sandbox executor run: exit status plus
/// the two captured byte streams. Lives only for the request that
/// produced it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawSandboxOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Terminal outcome of one submission, returned to the caller and never
/// mutated after construction.
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionOutcome {
    Success {
        result: Value,
        stdout: String,
        stderr: String,
    },
    Failure {
        kind: FailureKind,
        message: String,
        stdout: String,
        stderr: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected by the static screen before any process was spawned.
    Validation,
    /// The wrapper found no `main` in the executed namespace.
    NoEntryPoint,
    /// `main` has no return statement.
    NoReturnStatement,
    /// `main` returned a value with no JSON mapping.
    NonSerializableResult,
    /// User code raised.
    UserRaised,
    /// The sandbox process exceeded its wall-clock bound.
    Timeout,
    /// The sandbox executor binary could not be located.
    SandboxMissing,
    /// The sandbox executor itself exited non-zero or failed to launch.
    SandboxFailed,
    /// The sandbox produced output that does not conform to the wrapper
    /// protocol. Always a pipeline defect, never the user's fault.
    MalformedOutput,
}
