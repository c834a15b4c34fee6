use std::time::Duration;

use tokio::sync::mpsc;

use bridge_api::{Connection, ConnectionError, ConsumedRecord};

use crate::error::SessionError;
use crate::event::encode_event;
use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// Lifecycle of the multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxState {
    Active,
    Closing,
    Closed,
}

/// Result of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Events successfully written to the client.
    pub events_sent: u64,
    pub reason: ShutdownReason,
}

// ═══════════════════════════════════════════════════════════════
//  Session multiplexer: fan-in channel → client connection
// ═══════════════════════════════════════════════════════════════

/// Control loop of a session. Owns the connection after the handshake.
pub struct SessionMultiplexer<C> {
    conn: C,
    records: mpsc::Receiver<ConsumedRecord>,
    shutdown: ShutdownSignal,
    send_timeout: Option<Duration>,
    state: MuxState,
    events_sent: u64,
}

impl<C: Connection> SessionMultiplexer<C> {
    pub fn new(
        conn: C,
        records: mpsc::Receiver<ConsumedRecord>,
        shutdown: ShutdownSignal,
        send_timeout: Option<Duration>,
    ) -> Self {
        Self {
            conn,
            records,
            shutdown,
            send_timeout,
            state: MuxState::Active,
            events_sent: 0,
        }
    }

    pub fn state(&self) -> MuxState {
        self.state
    }

    /// Forward records until the shutdown signal fires, then close the
    /// connection and the record channel. Leaves the multiplexer
    /// [`MuxState::Closed`]; running it again only returns the report.
    pub async fn run(&mut self) -> SessionReport {
        while self.state == MuxState::Active {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    self.state = MuxState::Closing;
                }

                inbound = self.conn.recv() => match inbound {
                    Ok(Some(frame)) => {
                        tracing::debug!(bytes = frame.as_bytes().len(), "ignoring client frame after handshake");
                    }
                    Ok(None) => {
                        tracing::info!("client closed the connection");
                        self.shutdown.trigger(ShutdownReason::ConnectionClosed);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "client connection read failed");
                        self.shutdown.trigger(ShutdownReason::ConnectionClosed);
                    }
                },

                record = self.records.recv() => match record {
                    Some(record) => self.forward(record).await,
                    None => {
                        self.shutdown.trigger(ShutdownReason::SourcesDrained);
                    }
                },
            }
        }

        self.close().await;

        SessionReport {
            events_sent: self.events_sent,
            reason: self
                .shutdown
                .reason()
                .unwrap_or(ShutdownReason::ConnectionClosed),
        }
    }

    async fn forward(&mut self, record: ConsumedRecord) {
        let line = match encode_event(&record) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "failed to encode event, skipping"
                );
                return;
            }
        };

        tracing::debug!(
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            "sending event to client"
        );
        tracing::trace!(event = %line.trim_end());

        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return,
            result = with_timeout(self.send_timeout, self.conn.send(line)) => result,
        };

        match result {
            Ok(()) => self.events_sent += 1,
            Err(e) => {
                let e = SessionError::OutboundWrite(e);
                tracing::error!(error = %e, "error while sending to client");
                self.shutdown.trigger(ShutdownReason::WriteFailed);
            }
        }
    }

    /// Closes the connection at most once per multiplexer.
    async fn close(&mut self) {
        if self.state == MuxState::Closed {
            return;
        }
        self.records.close();
        tracing::info!(
            reason = ?self.shutdown.reason(),
            events_sent = self.events_sent,
            "closing client connection"
        );
        if let Err(e) = with_timeout(self.send_timeout, self.conn.close()).await {
            let e = SessionError::ConnectionClose(e);
            tracing::warn!(error = %e, "error while closing client connection");
        }
        self.state = MuxState::Closed;
    }
}

async fn with_timeout<F>(limit: Option<Duration>, op: F) -> Result<(), ConnectionError>
where
    F: std::future::Future<Output = Result<(), ConnectionError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, op)
            .await
            .unwrap_or(Err(ConnectionError::TimedOut(limit))),
        None => op.await,
    }
}
