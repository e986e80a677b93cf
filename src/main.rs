use std::panic;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::traits::executor::SandboxExecutor;
use crate::process::ProcessExecutor;

mod config;
mod constants;
mod core;
mod process;
mod server;

#[cfg(test)]
mod integration_test;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    set_panic_hook();

    let config = Arc::new(Config::from_env()?);

    match process::probe_version(&config.sandbox.nsjail_path).await {
        Some(version) => tracing::info!(%version, "sandbox executor available"),
        None => tracing::warn!(
            path = %config.sandbox.nsjail_path.display(),
            "sandbox executor probe failed; executions will report infrastructure errors"
        ),
    }

    let executor: Arc<dyn SandboxExecutor> = Arc::new(ProcessExecutor);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "execution service listening");

    server::accepting::serve(listener, executor, config).await?;

    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
