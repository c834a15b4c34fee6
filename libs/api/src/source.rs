use std::future::Future;
use std::pin::Pin;

use crate::{ConsumedRecord, PartitionTarget, SourceError};

// ════════════════════════════════════════════════════════════════
//  Message-queue capability
// ════════════════════════════════════════════════════════════════

/// Factory of per-partition record streams.
///
/// One instance is shared by every session of the process; each partition
/// task calls [`PartitionSource::open`] once and owns the returned stream.
pub trait PartitionSource: Send + Sync {
    /// Attach to `target` and return a lazy, usually infinite record stream.
    #[allow(clippy::type_complexity)]
    fn open(
        &self,
        target: &PartitionTarget,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn RecordStream>, SourceError>> + Send + '_>>;
}

/// Ordered stream of records from one partition.
pub trait RecordStream: Send {
    /// Next record in partition order. `None` = the source has ended.
    fn next(&mut self) -> Pin<Box<dyn Future<Output = Option<Result<ConsumedRecord, SourceError>>> + Send + '_>>;
}
