/// Category of a source error. Lets the session tell a partition that
/// could never be reached from one that broke while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid client configuration, rejected before any network I/O.
    Config,
    /// Broker unreachable, unknown topic or partition.
    Connect,
    /// Failure while pulling records from an attached partition.
    Fetch,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Connect => f.write_str("connect"),
            ErrorKind::Fetch => f.write_str("fetch"),
        }
    }
}

/// Error reported by a [`crate::PartitionSource`] or [`crate::RecordStream`].
///
/// Carries an `ErrorKind` for categorization and a human-readable message.
/// Sources never retry, so every `SourceError` is final for its partition.
#[derive(Clone)]
pub struct SourceError {
    kind: ErrorKind,
    message: String,
}

impl SourceError {
    /// Configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    /// Connectivity error.
    pub fn connect(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Connect, message: msg.into() }
    }

    /// Error while streaming.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Fetch, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prepend context to the message, keeping the kind.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        Self { kind: self.kind, message: format!("{ctx}: {}", self.message) }
    }
}

impl std::fmt::Debug for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceError {}

/// Failure on the client connection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    #[error("send: {0}")]
    Send(String),

    #[error("receive: {0}")]
    Receive(String),

    #[error("close: {0}")]
    Close(String),

    #[error("timed out after {0:?}")]
    TimedOut(std::time::Duration),
}
