use std::future::Future;
use std::pin::Pin;

use crate::ConnectionError;

/// Boxed future returned by [`Connection`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Frame received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Binary(Vec<u8>),
}

impl Inbound {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Inbound::Text(t) => t.as_bytes(),
            Inbound::Binary(b) => b,
        }
    }
}

/// Bidirectional, message-oriented client connection owned by one session.
///
/// Control frames (ping/pong) are handled by the implementation and never
/// surface through [`Connection::recv`].
pub trait Connection: Send {
    /// Next data frame. `Ok(None)` = the peer closed the connection.
    fn recv(&mut self) -> BoxFuture<'_, Result<Option<Inbound>, ConnectionError>>;

    /// Write one text message.
    fn send(&mut self, text: String) -> BoxFuture<'_, Result<(), ConnectionError>>;

    /// Close the connection. Called at most once per session.
    fn close(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>>;
}
