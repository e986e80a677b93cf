pub mod decoding;
pub mod invoking;
pub mod validating;
pub mod wrapping;

use std::sync::Arc;

use crate::config::Config;
use crate::core::domain::{ExecutionOutcome, FailureKind};
use crate::core::traits::executor::SandboxExecutor;

/// Runs one submission through the full pipeline: validate, wrap,
/// invoke, decode.
///
/// Every failure mode folds into [`ExecutionOutcome::Failure`]; this
/// function never returns an error and spawns no process for
/// submissions the validator rejects.
#[tracing::instrument(skip_all)]
pub async fn execute_script(
    executor: &Arc<dyn SandboxExecutor>,
    script: &str,
    config: &Config,
) -> ExecutionOutcome {
    if let Err(err) = validating::validate(script) {
        tracing::info!(error = %err, "script rejected by validation");
        return ExecutionOutcome::Failure {
            kind: FailureKind::Validation,
            message: err.to_string(),
            stdout: String::new(),
            stderr: String::new(),
        };
    }

    let wrapper = wrapping::build_wrapper(script);
    let raw = invoking::run_sandboxed(executor, &wrapper, &config.limits, &config.sandbox).await;
    decoding::decode(raw)
}
