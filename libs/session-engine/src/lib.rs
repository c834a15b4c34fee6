//! Session lifecycle of the Kafka → WebSocket bridge.
//!
//! One session = one client connection, the partition consumer tasks
//! declared by its handshake config, one fan-in channel and one
//! [`ShutdownSignal`]. Nothing is shared between sessions.

pub mod config;
pub mod error;
pub mod event;
pub mod multiplexer;
pub mod offset;
pub mod shutdown;
pub mod supervisor;

mod consumer;
mod session;

#[cfg(test)]
mod testing;

pub use config::{ConsumerSpec, SessionConfig, SessionOptions};
pub use error::SessionError;
pub use event::{WireEvent, encode_event};
pub use multiplexer::{MuxState, SessionMultiplexer, SessionReport};
pub use offset::resolve_offset;
pub use session::{receive_config, run_session};
pub use shutdown::{ShutdownReason, ShutdownSignal};
pub use supervisor::{ConsumerSupervisor, resolve_targets};
