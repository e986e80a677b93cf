use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use uuid::Uuid;

use crate::config::Config;
use crate::core::traits::executor::SandboxExecutor;
use crate::server::handling::handle_request;

const INTERNAL_ERROR_BODY: &str = r#"{"error":"Internal server error","stdout":"","stderr":""}"#;

/// Accepts connections and serves the newline-delimited JSON protocol,
/// one tokio task per connection. Requests on one connection are
/// handled in sequence; connections are handled concurrently with no
/// shared mutable state between them.
pub async fn serve(
    listener: TcpListener,
    executor: Arc<dyn SandboxExecutor>,
    config: Arc<Config>,
) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!(%peer, "accepted connection");

        let executor = executor.clone();
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(socket, &executor, &config).await {
                tracing::warn!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}

async fn handle_connection(
    socket: TcpStream,
    executor: &Arc<dyn SandboxExecutor>,
    config: &Config,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request_id = Uuid::new_v4();
        tracing::info!(%request_id, "handling request");

        let response = handle_request(&line, executor, config).await;
        let body = serde_json::to_string(&response).unwrap_or_else(|err| {
            tracing::error!(%request_id, error = %err, "failed to serialize response");
            INTERNAL_ERROR_BODY.to_string()
        });

        write_half.write_all(body.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
        write_half.flush().await?;

        tracing::info!(%request_id, "request finished");
    }

    Ok(())
}
