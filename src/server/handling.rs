use std::sync::Arc;

use serde_json::error::Category;

use crate::config::Config;
use crate::core::pipeline::execute_script;
use crate::core::traits::executor::SandboxExecutor;
use crate::server::models::{ExecuteRequest, ExecuteResponse};

/// Handles one request line: request-shape screening, then the
/// validation + execution pipeline. Malformed requests are rejected
/// before validation runs; everything else folds into a structured
/// response, never a crash.
#[tracing::instrument(skip_all)]
pub async fn handle_request(
    line: &str,
    executor: &Arc<dyn SandboxExecutor>,
    config: &Config,
) -> ExecuteResponse {
    let request: ExecuteRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            tracing::info!(error = %err, "rejected malformed request");
            return reject_parse_error(&err);
        }
    };

    let script_len = request.script.chars().count();
    if script_len > config.max_script_len {
        tracing::info!(script_len, "rejected over-length script");
        return ExecuteResponse::rejection(format!(
            "Script too long. Maximum {} characters allowed",
            config.max_script_len
        ));
    }

    execute_script(executor, &request.script, config).await.into()
}

fn reject_parse_error(err: &serde_json::Error) -> ExecuteResponse {
    // serde reports a well-formed object with a missing/mistyped field
    // as a data error; anything else means the body was not JSON.
    match err.classify() {
        Category::Data => ExecuteResponse::rejection("Missing \"script\" field in request"),
        _ => ExecuteResponse::rejection("Request must be JSON"),
    }
}
