use std::fmt;

// ════════════════════════════════════════════════════════════════
//  Start offset
// ════════════════════════════════════════════════════════════════

/// Resolved start position inside a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartOffset {
    /// Oldest record still retained by the broker.
    Earliest,
    /// Next record to be produced after the consumer attaches.
    Latest,
    /// Literal sequence position, always non-negative.
    At(i64),
}

impl StartOffset {
    /// Wire sentinel for [`StartOffset::Earliest`].
    pub const EARLIEST_RAW: i64 = -2;
    /// Wire sentinel for [`StartOffset::Latest`].
    pub const LATEST_RAW: i64 = -1;

    /// Signed representation: -2 / -1 for the symbolic positions, the
    /// literal position otherwise.
    pub fn raw(self) -> i64 {
        match self {
            StartOffset::Earliest => Self::EARLIEST_RAW,
            StartOffset::Latest => Self::LATEST_RAW,
            StartOffset::At(n) => n,
        }
    }

    /// Inverse of [`StartOffset::raw`]. Negative values other than the two
    /// sentinels have no meaning and yield `None`.
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            Self::EARLIEST_RAW => Some(StartOffset::Earliest),
            Self::LATEST_RAW => Some(StartOffset::Latest),
            n if n >= 0 => Some(StartOffset::At(n)),
            _ => None,
        }
    }
}

impl fmt::Display for StartOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartOffset::Earliest => f.write_str("oldest"),
            StartOffset::Latest => f.write_str("newest"),
            StartOffset::At(n) => write!(f, "{n}"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Partition target
// ════════════════════════════════════════════════════════════════

/// Everything a source needs to attach to a single partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTarget {
    /// Bootstrap address of the broker, `host:port`.
    pub broker: String,
    pub topic: String,
    pub partition: i32,
    pub offset: StartOffset,
}

impl fmt::Display for PartitionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.topic, self.partition, self.broker)
    }
}

// ════════════════════════════════════════════════════════════════
//  Consumed record
// ════════════════════════════════════════════════════════════════

/// One record pulled from a partition, in transit to the client.
///
/// A record without key or payload carries empty bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Unix seconds at which the bridge received the record.
    pub consumed_at: i64,
}
