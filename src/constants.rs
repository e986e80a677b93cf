/// Extra wall-clock seconds allowed beyond the configured execution
/// timeout before the invoker gives up waiting on the sandbox process.
pub const SANDBOX_GRACE_SECS: u64 = 5;

pub const PYTHON_GRAMMAR_ERR: &str = "Failed to load the Python grammar";
