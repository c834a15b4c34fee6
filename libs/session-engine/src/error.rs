use bridge_api::{ConnectionError, ErrorKind, SourceError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("config receive: {0}")]
    ConfigReceive(String),

    #[error("invalid offset descriptor '{0}' (expected an integer, 'oldest' or 'newest')")]
    InvalidOffsetDescriptor(String),

    #[error("consumer {topic}/{partition}: {source}")]
    ConsumerSource {
        topic: String,
        partition: i32,
        source: SourceError,
    },

    #[error("outbound write: {0}")]
    OutboundWrite(ConnectionError),

    #[error("connection close: {0}")]
    ConnectionClose(ConnectionError),
}

impl SessionError {
    /// Kind of the underlying source failure, for consumer errors.
    pub fn source_kind(&self) -> Option<ErrorKind> {
        match self {
            SessionError::ConsumerSource { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
