use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Why a session is being torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An offset descriptor could not be resolved.
    InvalidOffset,
    /// A partition consumer hit a fatal source error.
    ConsumerFailed { topic: String, partition: i32 },
    /// Writing an event to the client failed.
    WriteFailed,
    /// The client closed the connection or its read side broke.
    ConnectionClosed,
    /// Every partition consumer ended and nothing is left to forward.
    SourcesDrained,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::InvalidOffset => f.write_str("invalid offset"),
            ShutdownReason::ConsumerFailed { topic, partition } => {
                write!(f, "consumer {topic}/{partition} failed")
            }
            ShutdownReason::WriteFailed => f.write_str("write failed"),
            ShutdownReason::ConnectionClosed => f.write_str("connection closed"),
            ShutdownReason::SourcesDrained => f.write_str("sources drained"),
        }
    }
}

/// Broadcast-once cancellation shared by every task of a session.
///
/// Any number of clones may fire it; firing never blocks and only the first
/// reason is kept. Every waiter of [`ShutdownSignal::cancelled`] wakes up,
/// including those that start waiting after the signal fired.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<ShutdownReason>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Returns `true` for the call that actually fired it.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        // Reason is published before the token flips.
        let first = self.reason.set(reason.clone()).is_ok();
        if first {
            tracing::info!(%reason, "session shutdown triggered");
        } else {
            tracing::debug!(%reason, "session shutdown already triggered");
        }
        self.token.cancel();
        first
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// First reason passed to [`ShutdownSignal::trigger`], if fired.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().cloned()
    }

    /// Completes once the signal has fired.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("triggered", &self.is_triggered())
            .field("reason", &self.reason.get())
            .finish()
    }
}
