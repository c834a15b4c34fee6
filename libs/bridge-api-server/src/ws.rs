use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::Instrument;

use bridge_api::{BoxFuture, Connection, ConnectionError, Inbound};
use session_engine::run_session;

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  WebSocket: /ws
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_session(socket, state))
}

async fn ws_session(socket: WebSocket, state: AppState) {
    let id = state.sessions.fetch_add(1, Ordering::Relaxed) + 1;
    let span = tracing::info_span!("session", id);

    async move {
        tracing::info!("opened websocket connection");
        match run_session(WsConnection::new(socket), state.source.clone(), &state.options).await {
            Ok(report) => {
                tracing::debug!(events_sent = report.events_sent, reason = %report.reason, "session finished");
            }
            Err(e) => {
                tracing::warn!(error = %e, "session aborted");
            }
        }
    }
    .instrument(span)
    .await
}

// ═══════════════════════════════════════════════════════════════
//  Connection adapter
// ═══════════════════════════════════════════════════════════════

/// axum `WebSocket` as a session [`Connection`].
pub struct WsConnection {
    socket: WebSocket,
    /// Peer sent a close frame or the stream ended.
    peer_closed: bool,
}

impl WsConnection {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket, peer_closed: false }
    }
}

impl Connection for WsConnection {
    fn recv(&mut self) -> BoxFuture<'_, Result<Option<Inbound>, ConnectionError>> {
        Box::pin(async move {
            loop {
                let msg = match self.socket.recv().await {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        self.peer_closed = true;
                        return Err(ConnectionError::Receive(e.to_string()));
                    }
                    None => {
                        self.peer_closed = true;
                        return Ok(None);
                    }
                };

                match msg {
                    Message::Text(t) => return Ok(Some(Inbound::Text(t.as_str().to_owned()))),
                    Message::Binary(b) => return Ok(Some(Inbound::Binary(b.to_vec()))),
                    Message::Close(_) => {
                        self.peer_closed = true;
                        return Ok(None);
                    }
                    // Pings are answered by the protocol layer.
                    Message::Ping(_) | Message::Pong(_) => continue,
                }
            }
        })
    }

    fn send(&mut self, text: String) -> BoxFuture<'_, Result<(), ConnectionError>> {
        Box::pin(async move {
            self.socket
                .send(Message::Text(text.into()))
                .await
                .map_err(|e| ConnectionError::Send(e.to_string()))
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>> {
        Box::pin(async move {
            if self.peer_closed {
                return Ok(());
            }
            self.socket
                .send(Message::Close(None))
                .await
                .map_err(|e| ConnectionError::Close(e.to_string()))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    use futures::{SinkExt, StreamExt};
    use session_engine::SessionOptions;
    use tokio_tungstenite::tungstenite::Message as ClientMessage;
    use tokio_util::sync::CancellationToken;

    use bridge_api::{
        ConsumedRecord, PartitionSource, PartitionTarget, RecordStream, SourceError, StartOffset,
    };

    /// Partition source whose streams never yield.
    pub(crate) struct IdleSource;

    impl PartitionSource for IdleSource {
        fn open(
            &self,
            _target: &PartitionTarget,
        ) -> Pin<Box<dyn Future<Output = Result<Box<dyn RecordStream>, SourceError>> + Send + '_>> {
            Box::pin(async { Ok(Box::new(Replay(Vec::new())) as Box<dyn RecordStream>) })
        }
    }

    /// Replays two records of the requested partition, starting at the
    /// requested literal offset, then stays idle.
    struct ReplaySource;

    impl PartitionSource for ReplaySource {
        fn open(
            &self,
            target: &PartitionTarget,
        ) -> Pin<Box<dyn Future<Output = Result<Box<dyn RecordStream>, SourceError>> + Send + '_>> {
            let target = target.clone();
            Box::pin(async move {
                let start = match target.offset {
                    StartOffset::At(n) => n,
                    _ => return Err(SourceError::config("replay needs a literal offset")),
                };
                let mut records: Vec<_> = (start..start + 2)
                    .map(|offset| ConsumedRecord {
                        topic: target.topic.clone(),
                        partition: target.partition,
                        offset,
                        key: br#"k"1"#.to_vec(),
                        value: br#"{"n":1}"#.to_vec(),
                        consumed_at: 1_700_000_000,
                    })
                    .collect();
                records.reverse();
                Ok(Box::new(Replay(records)) as Box<dyn RecordStream>)
            })
        }
    }

    struct Replay(Vec<ConsumedRecord>);

    impl RecordStream for Replay {
        fn next(&mut self) -> Pin<Box<dyn Future<Output = Option<Result<ConsumedRecord, SourceError>>> + Send + '_>> {
            Box::pin(async move {
                match self.0.pop() {
                    Some(record) => Some(Ok(record)),
                    None => std::future::pending().await,
                }
            })
        }
    }

    #[tokio::test]
    async fn streams_events_over_websocket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = crate::router(Arc::new(ReplaySource), SessionOptions::default(), "webroot");
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(crate::serve(listener, app, shutdown.clone()));

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        client
            .send(ClientMessage::Text(
                r#"{"consumers":[{"broker":"b","topic":"orders","partition":4,"offset":"41"}]}"#.into(),
            ))
            .await
            .unwrap();

        let mut events = Vec::new();
        while events.len() < 2 {
            let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("no event from server")
                .unwrap()
                .unwrap();
            if let ClientMessage::Text(text) = msg {
                events.push(text.as_str().to_owned());
            }
        }

        for (event, offset) in events.iter().zip(["41", "42"]) {
            assert!(event.ends_with('\n'));
            let v: serde_json::Value = serde_json::from_str(event.trim_end()).unwrap();
            assert_eq!(v["topic"], "orders");
            assert_eq!(v["partition"], "4");
            assert_eq!(v["offset"], offset);
            assert_eq!(v["key"], r#"k"1"#);
            assert_eq!(v["value"], r#"{"n":1}"#);
            assert_eq!(v["consumedUnixTimestamp"], "1700000000");
        }

        client.close(None).await.unwrap();
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn bad_offset_closes_websocket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = crate::router(Arc::new(IdleSource), SessionOptions::default(), "webroot");
        let shutdown = CancellationToken::new();
        tokio::spawn(crate::serve(listener, app, shutdown.clone()));

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        client
            .send(ClientMessage::Text(
                r#"{"consumers":[{"broker":"b","topic":"t","partition":0,"offset":"banana"}]}"#.into(),
            ))
            .await
            .unwrap();

        let next = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("connection left open");
        assert!(matches!(next, Some(Ok(ClientMessage::Close(_))) | None | Some(Err(_))));
        shutdown.cancel();
    }
}
