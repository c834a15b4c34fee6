//! Shared types and capability traits of the Kafka → WebSocket bridge.
//!
//! The crate does not depend on an async runtime: the message-queue client and the
//! client connection are described only as object-safe traits returning
//! boxed futures, implemented by `kafka-source` and `bridge-api-server`.

mod connection;
mod error;
mod source;
mod types;
pub mod util;

pub use connection::{BoxFuture, Connection, Inbound};
pub use error::{ConnectionError, ErrorKind, SourceError};
pub use source::{PartitionSource, RecordStream};
pub use types::{ConsumedRecord, PartitionTarget, StartOffset};
pub use util::unix_now_secs;
