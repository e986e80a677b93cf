use std::path::PathBuf;
use std::str::FromStr;

use crate::core::domain::ResourceLimits;

/// Process-wide configuration, read from the environment exactly once
/// at startup and passed by reference into every component that needs
/// it. Nothing downstream reads ambient environment state directly.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Maximum submitted-script length in characters.
    pub max_script_len: usize,
    pub limits: ResourceLimits,
    pub sandbox: SandboxConfig,
}

/// Locations and environment whitelist values for the sandbox executor.
#[derive(Clone, Debug)]
pub struct SandboxConfig {
    pub nsjail_path: PathBuf,
    pub python_path: PathBuf,
    pub python_search_path: String,
    pub ld_library_path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            host: env_or("HOST", "0.0.0.0".to_string())?,
            port: env_or("PORT", 8080)?,
            max_script_len: env_or("MAX_CODE_LENGTH", 10_000)?,
            limits: ResourceLimits {
                time_limit_secs: env_or("EXECUTION_TIMEOUT", 30)?,
                memory_limit_mb: env_or("MEMORY_LIMIT_MB", 1024)?,
                cpu_limit_secs: env_or("CPU_LIMIT_SECS", 10)?,
                max_file_size_mb: env_or("MAX_FILE_SIZE_MB", 64)?,
                max_open_files: env_or("MAX_OPEN_FILES", 128)?,
            },
            sandbox: SandboxConfig {
                nsjail_path: PathBuf::from(env_or(
                    "NSJAIL_PATH",
                    "/usr/local/bin/nsjail".to_string(),
                )?),
                python_path: PathBuf::from(env_or(
                    "PYTHON_PATH",
                    "/usr/local/bin/python3".to_string(),
                )?),
                python_search_path: env_or(
                    "SANDBOX_PYTHONPATH",
                    "/usr/local/lib/python3.11/site-packages".to_string(),
                )?,
                ld_library_path: env_or(
                    "SANDBOX_LD_LIBRARY_PATH",
                    "/usr/local/lib:/usr/lib:/lib".to_string(),
                )?,
            },
        })
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    parse_env(key, std::env::var(key).ok(), default)
}

fn parse_env<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
