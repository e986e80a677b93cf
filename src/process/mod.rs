pub mod executor;

pub use executor::{ProcessExecutor, probe_version};
