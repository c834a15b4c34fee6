//! In-memory fakes of the source and connection capabilities.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use bridge_api::{
    BoxFuture, Connection, ConnectionError, ConsumedRecord, Inbound, PartitionSource,
    PartitionTarget, RecordStream, SourceError,
};

pub(crate) fn record(topic: &str, partition: i32, offset: i64, key: &str, value: &str) -> ConsumedRecord {
    ConsumedRecord {
        topic: topic.into(),
        partition,
        offset,
        key: key.as_bytes().to_vec(),
        value: value.as_bytes().to_vec(),
        consumed_at: 1_700_000_000,
    }
}

// ═══════════════════════════════════════════════════════════════
//  FakeSource
// ═══════════════════════════════════════════════════════════════

#[derive(Clone)]
enum Script {
    Records {
        items: Vec<Result<ConsumedRecord, SourceError>>,
        /// Stay pending after the last item instead of ending.
        hold_open: bool,
    },
    FailOpen(SourceError),
}

/// Scripted `PartitionSource`. Unscripted partitions stay open with no
/// records.
#[derive(Default)]
pub(crate) struct FakeSource {
    scripts: Mutex<HashMap<(String, i32), Script>>,
    opened: Mutex<Vec<PartitionTarget>>,
    live: Arc<AtomicUsize>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(
        &self,
        topic: &str,
        partition: i32,
        items: Vec<Result<ConsumedRecord, SourceError>>,
        hold_open: bool,
    ) {
        self.scripts.lock().unwrap().insert(
            (topic.to_string(), partition),
            Script::Records { items, hold_open },
        );
    }

    pub(crate) fn fail_open(&self, topic: &str, partition: i32, err: SourceError) {
        self.scripts
            .lock()
            .unwrap()
            .insert((topic.to_string(), partition), Script::FailOpen(err));
    }

    pub(crate) fn opened(&self) -> Vec<PartitionTarget> {
        self.opened.lock().unwrap().clone()
    }

    /// Streams opened and not yet dropped.
    pub(crate) fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl PartitionSource for FakeSource {
    fn open(
        &self,
        target: &PartitionTarget,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn RecordStream>, SourceError>> + Send + '_>> {
        let target = target.clone();
        Box::pin(async move {
            self.opened.lock().unwrap().push(target.clone());
            let script = self
                .scripts
                .lock()
                .unwrap()
                .get(&(target.topic.clone(), target.partition))
                .cloned()
                .unwrap_or(Script::Records { items: Vec::new(), hold_open: true });

            match script {
                Script::FailOpen(err) => Err(err),
                Script::Records { items, hold_open } => {
                    self.live.fetch_add(1, Ordering::SeqCst);
                    Ok(Box::new(FakeStream {
                        items: items.into(),
                        hold_open,
                        live: self.live.clone(),
                    }) as Box<dyn RecordStream>)
                }
            }
        })
    }
}

struct FakeStream {
    items: VecDeque<Result<ConsumedRecord, SourceError>>,
    hold_open: bool,
    live: Arc<AtomicUsize>,
}

impl RecordStream for FakeStream {
    fn next(&mut self) -> Pin<Box<dyn Future<Output = Option<Result<ConsumedRecord, SourceError>>> + Send + '_>> {
        Box::pin(async move {
            match self.items.pop_front() {
                Some(item) => {
                    tokio::task::yield_now().await;
                    Some(item)
                }
                None if self.hold_open => std::future::pending().await,
                None => None,
            }
        })
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// ═══════════════════════════════════════════════════════════════
//  FakeConnection
// ═══════════════════════════════════════════════════════════════

/// Test-side handle of a [`FakeConnection`].
pub(crate) struct FakePeer {
    /// `None` closes the connection from the client side.
    pub(crate) inbound: mpsc::UnboundedSender<Option<Inbound>>,
    pub(crate) sent: Arc<Mutex<Vec<String>>>,
    pub(crate) send_attempts: Arc<AtomicUsize>,
    pub(crate) closes: Arc<AtomicUsize>,
}

impl FakePeer {
    pub(crate) fn send_text(&self, text: &str) {
        let _ = self.inbound.send(Some(Inbound::Text(text.to_string())));
    }

    pub(crate) fn hang_up(&self) {
        let _ = self.inbound.send(None);
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakeConnection {
    inbound: mpsc::UnboundedReceiver<Option<Inbound>>,
    sent: Arc<Mutex<Vec<String>>>,
    send_attempts: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    /// 1-based index of the write that fails.
    fail_on_send: Option<usize>,
    /// Writes never complete.
    stall_sends: bool,
}

impl FakeConnection {
    pub(crate) fn pair() -> (Self, FakePeer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let send_attempts = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        let conn = Self {
            inbound: rx,
            sent: sent.clone(),
            send_attempts: send_attempts.clone(),
            closes: closes.clone(),
            fail_on_send: None,
            stall_sends: false,
        };
        let peer = FakePeer { inbound: tx, sent, send_attempts, closes };
        (conn, peer)
    }

    pub(crate) fn fail_on_send(mut self, nth: usize) -> Self {
        self.fail_on_send = Some(nth);
        self
    }

    pub(crate) fn stall_sends(mut self) -> Self {
        self.stall_sends = true;
        self
    }
}

impl Connection for FakeConnection {
    fn recv(&mut self) -> BoxFuture<'_, Result<Option<Inbound>, ConnectionError>> {
        Box::pin(async move {
            match self.inbound.recv().await {
                Some(frame) => Ok(frame),
                None => Ok(None),
            }
        })
    }

    fn send(&mut self, text: String) -> BoxFuture<'_, Result<(), ConnectionError>> {
        Box::pin(async move {
            let attempt = self.send_attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.stall_sends {
                std::future::pending::<()>().await;
            }
            if self.fail_on_send == Some(attempt) {
                return Err(ConnectionError::Send("broken pipe".into()));
            }
            self.sent.lock().unwrap().push(text);
            Ok(())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>> {
        Box::pin(async move {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
