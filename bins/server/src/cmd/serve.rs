use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use bridge_api::PartitionSource;
use bridge_api_server::ApiServerError;
use kafka_source::KafkaPartitionSource;

use crate::config::{Cli, ServerConfig};
use crate::error::ServerError;

/// How [`run`] ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Stopped {
    /// The HTTP server returned on its own.
    ServerExited,
    /// SIGINT or SIGTERM. The caller exits the process without draining.
    Signal,
}

pub async fn run(cli: Cli) -> Result<Stopped, ServerError> {
    tracing::info!("flowbro-server starting");

    // --- Load config ---
    let config = ServerConfig::resolve(&cli)?;
    if let Some(path) = &cli.config {
        tracing::info!(config = %path.display(), "loaded config");
    }

    // --- Kafka source shared by every session ---
    let source: Arc<dyn PartitionSource> = Arc::new(KafkaPartitionSource::new(config.kafka.clone()));

    // --- API server (HTTP + WS) ---
    let options = config.session_options();
    let app = bridge_api_server::router(source, options, config.webroot.clone());

    tracing::info!(
        port = config.port,
        webroot = %config.webroot.display(),
        channel_buffer = options.channel_buffer,
        "server ready"
    );

    // Never cancelled: a signal ends the process instead.
    let server = bridge_api_server::run(config.port, app, CancellationToken::new());
    race_signal(server, shutdown_signal()).await
}

async fn race_signal<S, F>(server: S, signal: F) -> Result<Stopped, ServerError>
where
    S: Future<Output = Result<(), ApiServerError>>,
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = server => {
            result?;
            Ok(Stopped::ServerExited)
        }
        result = signal => {
            result?;
            tracing::info!("shutting down");
            Ok(Stopped::Signal)
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = term.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
