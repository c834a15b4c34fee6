use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use bridge_api::{Connection, PartitionSource};

use crate::config::{SessionConfig, SessionOptions};
use crate::error::SessionError;
use crate::multiplexer::{SessionMultiplexer, SessionReport};
use crate::shutdown::ShutdownSignal;
use crate::supervisor::ConsumerSupervisor;

/// Run one session end to end on an accepted connection.
///
/// Handshake → all-or-nothing consumer launch → multiplexing → teardown.
/// Returns once the connection is closed and every consumer task has
/// exited. Handshake and offset errors close the connection and are
/// returned; everything later ends up in the [`SessionReport`].
///
/// A handshake with no consumers closes the connection right away
/// ([`crate::ShutdownReason::SourcesDrained`]).
pub async fn run_session<C: Connection>(
    mut conn: C,
    source: Arc<dyn PartitionSource>,
    options: &SessionOptions,
) -> Result<SessionReport, SessionError> {
    let config = match receive_config(&mut conn, options.handshake_timeout).await {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "did not receive config from client");
            close_quietly(&mut conn).await;
            return Err(e);
        }
    };
    tracing::info!(consumers = config.consumers.len(), "received session config");

    let shutdown = ShutdownSignal::new();
    let (tx, rx) = mpsc::channel(options.channel_buffer.max(1));

    let consumers = match ConsumerSupervisor::launch(&config, source, tx, &shutdown) {
        Ok(consumers) => consumers,
        Err(e) => {
            close_quietly(&mut conn).await;
            return Err(e);
        }
    };
    tracing::info!(launched = consumers.launched(), "session active");

    let report = SessionMultiplexer::new(conn, rx, shutdown, options.send_timeout)
        .run()
        .await;

    consumers.join().await;
    tracing::info!(
        reason = %report.reason,
        events_sent = report.events_sent,
        "session closed"
    );
    Ok(report)
}

/// Wait for the first data frame and decode it as a [`SessionConfig`].
pub async fn receive_config<C: Connection>(
    conn: &mut C,
    timeout: Option<Duration>,
) -> Result<SessionConfig, SessionError> {
    let frame = match timeout {
        Some(limit) => tokio::time::timeout(limit, conn.recv())
            .await
            .map_err(|_| SessionError::ConfigReceive(format!("no config within {limit:?}")))?,
        None => conn.recv().await,
    };

    match frame {
        Ok(Some(frame)) => SessionConfig::from_slice(frame.as_bytes()),
        Ok(None) => Err(SessionError::ConfigReceive(
            "connection closed before config".into(),
        )),
        Err(e) => Err(SessionError::ConfigReceive(e.to_string())),
    }
}

async fn close_quietly<C: Connection>(conn: &mut C) {
    if let Err(e) = conn.close().await {
        let e = SessionError::ConnectionClose(e);
        tracing::warn!(error = %e, "error while closing client connection");
    }
}
