use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::domain::ExecutionOutcome;

/// Inbound request body: one JSON object per line.
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub script: String,
}

/// Outbound response body, serialized as one JSON line. Successful
/// executions report the entry point's return value and captured
/// stdout; failures report the error plus both captured streams.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExecuteResponse {
    Success {
        result: Value,
        stdout: String,
    },
    Error {
        error: String,
        stdout: String,
        stderr: String,
    },
}

impl ExecuteResponse {
    /// A request-layer rejection with no captured output.
    pub fn rejection(message: impl Into<String>) -> Self {
        ExecuteResponse::Error {
            error: message.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

impl From<ExecutionOutcome> for ExecuteResponse {
    fn from(outcome: ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Success { result, stdout, .. } => {
                ExecuteResponse::Success { result, stdout }
            }
            ExecutionOutcome::Failure {
                message,
                stdout,
                stderr,
                ..
            } => ExecuteResponse::Error {
                error: message,
                stdout,
                stderr,
            },
        }
    }
}
