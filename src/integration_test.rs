//! Full-pipeline tests: validate → wrap → invoke → decode against a
//! mocked sandbox executor, covering the failure taxonomy end to end.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::config::{Config, SandboxConfig};
use crate::core::domain::{ExecutionOutcome, FailureKind, RawSandboxOutput, ResourceLimits};
use crate::core::pipeline::execute_script;
use crate::core::pipeline::wrapping::build_wrapper;
use crate::core::traits::executor::{InvokeError, MockSandboxExecutor, SandboxExecutor};

const HELLO_SCRIPT: &str = "\
def main():
    print('hi')
    return {'message': 'hello'}
";

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_script_len: 10_000,
        limits: ResourceLimits {
            time_limit_secs: 30,
            memory_limit_mb: 1024,
            cpu_limit_secs: 10,
            max_file_size_mb: 64,
            max_open_files: 128,
        },
        sandbox: SandboxConfig {
            // An existing path, so the pipeline reaches the mocked
            // executor instead of short-circuiting on the binary check.
            nsjail_path: std::env::temp_dir(),
            python_path: "/usr/local/bin/python3".into(),
            python_search_path: "/usr/local/lib/python3.11/site-packages".to_string(),
            ld_library_path: "/usr/local/lib:/usr/lib:/lib".to_string(),
        },
    }
}

fn executor_reporting(stdout: &str) -> Arc<dyn SandboxExecutor> {
    let stdout = stdout.to_string();
    let mut mock = MockSandboxExecutor::new();
    mock.expect_invoke().returning(move |_, _| {
        Ok(RawSandboxOutput {
            status: 0,
            stdout: stdout.clone(),
            stderr: String::new(),
        })
    });
    Arc::new(mock)
}

fn executor_failing(err: InvokeError) -> Arc<dyn SandboxExecutor> {
    let mut mock = MockSandboxExecutor::new();
    mock.expect_invoke().returning(move |_, _| Err(err.clone()));
    Arc::new(mock)
}

#[tokio::test]
async fn successful_execution_returns_result_and_stdout() {
    let report = r#"{"success": true, "result": {"message": "hello"}, "stdout": "hi", "stderr": ""}"#;
    let executor = executor_reporting(report);

    let outcome = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;

    assert_eq!(
        outcome,
        ExecutionOutcome::Success {
            result: json!({"message": "hello"}),
            stdout: "hi".to_string(),
            stderr: String::new(),
        }
    );
}

#[tokio::test]
async fn identical_submissions_yield_identical_outcomes() {
    let report = r#"{"success": true, "result": 7, "stdout": "", "stderr": ""}"#;
    let executor = executor_reporting(report);

    let first = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;
    let second = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn denylisted_script_never_reaches_the_executor() {
    let mut mock = MockSandboxExecutor::new();
    mock.expect_invoke().times(0);
    let executor: Arc<dyn SandboxExecutor> = Arc::new(mock);

    let outcome = execute_script(
        &executor,
        "import subprocess\ndef main():\n    return 1\n",
        &test_config(),
    )
    .await;

    let ExecutionOutcome::Failure { kind, message, .. } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(kind, FailureKind::Validation);
    assert_eq!(message, "Unsafe operation detected: import subprocess");
}

#[tokio::test]
async fn syntactically_invalid_script_never_reaches_the_executor() {
    let mut mock = MockSandboxExecutor::new();
    mock.expect_invoke().times(0);
    let executor: Arc<dyn SandboxExecutor> = Arc::new(mock);

    let outcome = execute_script(&executor, "def main(:\n    return 1\n", &test_config()).await;

    let ExecutionOutcome::Failure { kind, message, .. } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(kind, FailureKind::Validation);
    assert!(message.starts_with("Syntax error in code:"), "got {message:?}");
}

#[tokio::test]
async fn script_without_main_never_reaches_the_executor() {
    let mut mock = MockSandboxExecutor::new();
    mock.expect_invoke().times(0);
    let executor: Arc<dyn SandboxExecutor> = Arc::new(mock);

    let outcome = execute_script(&executor, "x = 1\n", &test_config()).await;

    assert_eq!(
        outcome,
        ExecutionOutcome::Failure {
            kind: FailureKind::Validation,
            message: "Code must contain a main() function".to_string(),
            stdout: String::new(),
            stderr: String::new(),
        }
    );
}

#[tokio::test]
async fn wrapper_reported_missing_entry_point_is_classified() {
    // Defense in depth: the wrapper re-checks for main() even though
    // the validator normally rejects such scripts first.
    let report = r#"{"success": false, "error": "No main() function found", "traceback": "Traceback...", "stdout": "", "stderr": ""}"#;
    let executor = executor_reporting(report);

    let outcome = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;

    let ExecutionOutcome::Failure { kind, .. } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(kind, FailureKind::NoEntryPoint);
}

#[tokio::test]
async fn non_serializable_result_names_the_offending_type() {
    let report = r#"{"success": false, "error": "main() function must return JSON serializable data. Got function: Object of type function is not JSON serializable", "traceback": "", "stdout": "", "stderr": ""}"#;
    let executor = executor_reporting(report);

    let outcome = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;

    let ExecutionOutcome::Failure { kind, message, .. } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(kind, FailureKind::NonSerializableResult);
    assert!(message.contains("Got function"), "got {message:?}");
}

#[tokio::test]
async fn user_exception_carries_partial_output() {
    let report = r#"{"success": false, "error": "RuntimeError: boom", "traceback": "Traceback...", "stdout": "before the crash", "stderr": ""}"#;
    let executor = executor_reporting(report);

    let outcome = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;

    assert_eq!(
        outcome,
        ExecutionOutcome::Failure {
            kind: FailureKind::UserRaised,
            message: "RuntimeError: boom".to_string(),
            stdout: "before the crash".to_string(),
            stderr: String::new(),
        }
    );
}

#[tokio::test]
async fn timed_out_execution_is_reported_as_timeout() {
    let executor = executor_failing(InvokeError::TimedOut);

    let outcome = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;

    let ExecutionOutcome::Failure { kind, message, .. } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(kind, FailureKind::Timeout);
    assert_eq!(message, "Code execution timed out");
}

#[tokio::test]
async fn missing_sandbox_binary_is_an_infrastructure_failure() {
    let mut config = test_config();
    config.sandbox.nsjail_path = "/nonexistent/nsjail".into();

    let mut mock = MockSandboxExecutor::new();
    mock.expect_invoke().times(0);
    let executor: Arc<dyn SandboxExecutor> = Arc::new(mock);

    let outcome = execute_script(&executor, HELLO_SCRIPT, &config).await;

    let ExecutionOutcome::Failure { kind, .. } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(kind, FailureKind::SandboxMissing);
}

#[tokio::test]
async fn garbage_sandbox_output_is_a_pipeline_defect() {
    let executor = executor_reporting("free(): invalid pointer");

    let outcome = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;

    let ExecutionOutcome::Failure { kind, .. } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(kind, FailureKind::MalformedOutput);
}

#[tokio::test]
async fn executor_receives_the_generated_wrapper() {
    let expected_wrapper = build_wrapper(HELLO_SCRIPT);
    let report = r#"{"success": true, "result": null, "stdout": "", "stderr": ""}"#.to_string();

    let mut mock = MockSandboxExecutor::new();
    mock.expect_invoke()
        .withf(move |invocation, wait| {
            invocation.args.last() == Some(&expected_wrapper)
                && *wait == Duration::from_secs(35)
        })
        .times(1)
        .returning(move |_, _| {
            Ok(RawSandboxOutput {
                status: 0,
                stdout: report.clone(),
                stderr: String::new(),
            })
        });
    let executor: Arc<dyn SandboxExecutor> = Arc::new(mock);

    let outcome = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;
    assert!(matches!(outcome, ExecutionOutcome::Success { .. }));
}

/// The wrapper's emitted JSON line, fed back through the decoder,
/// reproduces the outcome the wrapper intended to express.
#[tokio::test]
async fn wrapper_protocol_round_trips_through_the_decoder() {
    let intents = [
        (
            json!({"success": true, "result": [1, "two", null], "stdout": "out", "stderr": "err"}),
            ExecutionOutcome::Success {
                result: json!([1, "two", null]),
                stdout: "out".to_string(),
                stderr: "err".to_string(),
            },
        ),
        (
            json!({"success": false, "error": "KeyError: 'x'", "traceback": "Traceback...", "stdout": "", "stderr": ""}),
            ExecutionOutcome::Failure {
                kind: FailureKind::UserRaised,
                message: "KeyError: 'x'".to_string(),
                stdout: String::new(),
                stderr: String::new(),
            },
        ),
    ];

    for (report, expected) in intents {
        let executor = executor_reporting(&report.to_string());
        let outcome = execute_script(&executor, HELLO_SCRIPT, &test_config()).await;
        assert_eq!(outcome, expected);
    }
}
