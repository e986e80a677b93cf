use serde_json::Value;

use crate::core::domain::{ExecutionOutcome, FailureKind, RawSandboxOutput};
use crate::core::traits::executor::InvokeError;

/// One line of the wrapper protocol. Unknown fields are ignored so
/// wrapper evolution does not break older decoders.
#[derive(Debug, serde::Deserialize)]
struct WrapperReport {
    success: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: String,
    #[serde(default)]
    traceback: String,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

/// Parses raw sandbox output into a typed outcome.
///
/// Executor-level failures (timeout, missing or misbehaving executor)
/// pass through unchanged. Otherwise the trimmed stdout must be one
/// JSON object per the wrapper contract; anything else is a pipeline
/// defect reported as malformed output. Isolation chatter on stderr is
/// never interpreted.
pub fn decode(raw: Result<RawSandboxOutput, InvokeError>) -> ExecutionOutcome {
    let output = match raw {
        Ok(output) => output,
        Err(err) => return decode_invoke_error(err),
    };

    let body = output.stdout.trim();
    if body.is_empty() {
        return ExecutionOutcome::Failure {
            kind: FailureKind::MalformedOutput,
            message: "No output from execution".to_string(),
            stdout: output.stdout.clone(),
            stderr: output.stderr,
        };
    }

    let report: WrapperReport = match serde_json::from_str(body) {
        Ok(report) => report,
        Err(err) => {
            return ExecutionOutcome::Failure {
                kind: FailureKind::MalformedOutput,
                message: format!("Failed to parse execution output: {err}"),
                stdout: output.stdout.clone(),
                stderr: output.stderr,
            };
        }
    };

    if report.success {
        ExecutionOutcome::Success {
            result: report.result,
            stdout: report.stdout,
            stderr: report.stderr,
        }
    } else {
        if !report.traceback.is_empty() {
            tracing::debug!(traceback = %report.traceback, "user code failed inside the sandbox");
        }
        ExecutionOutcome::Failure {
            kind: classify_wrapper_error(&report.error),
            message: report.error,
            stdout: report.stdout,
            stderr: report.stderr,
        }
    }
}

fn decode_invoke_error(err: InvokeError) -> ExecutionOutcome {
    let message = err.to_string();
    let (kind, stdout, stderr) = match err {
        InvokeError::Missing { .. } => (FailureKind::SandboxMissing, String::new(), String::new()),
        InvokeError::TimedOut => (FailureKind::Timeout, String::new(), String::new()),
        InvokeError::ExecutorFailed { output } => {
            (FailureKind::SandboxFailed, output.stdout, output.stderr)
        }
        InvokeError::FailedToLaunch { .. } => {
            (FailureKind::SandboxFailed, String::new(), String::new())
        }
    };

    ExecutionOutcome::Failure {
        kind,
        message,
        stdout,
        stderr,
    }
}

/// Maps the wrapper's free-text error onto a known failure category.
/// Messages that match no category are treated as raised by user code.
fn classify_wrapper_error(message: &str) -> FailureKind {
    if message.contains("No main() function found") {
        FailureKind::NoEntryPoint
    } else if message.contains("must return JSON serializable") {
        FailureKind::NonSerializableResult
    } else if message.contains("must have a return statement") {
        FailureKind::NoReturnStatement
    } else {
        FailureKind::UserRaised
    }
}
