use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use bridge_api::{ConsumedRecord, PartitionSource, PartitionTarget};

use crate::config::SessionConfig;
use crate::consumer::consume_partition;
use crate::error::SessionError;
use crate::offset::resolve_offset;
use crate::shutdown::{ShutdownReason, ShutdownSignal};

/// Resolve every consumer spec of `config` into a partition target.
///
/// All-or-nothing: the first unresolvable offset fails the whole config.
pub fn resolve_targets(config: &SessionConfig) -> Result<Vec<PartitionTarget>, SessionError> {
    config
        .consumers
        .iter()
        .map(|spec| -> Result<PartitionTarget, SessionError> {
            let offset = resolve_offset(&spec.offset).inspect_err(|e| {
                tracing::warn!(
                    topic = %spec.topic,
                    partition = spec.partition,
                    error = %e,
                    "rejecting session config"
                );
            })?;
            Ok(PartitionTarget {
                broker: spec.broker.clone(),
                topic: spec.topic.clone(),
                partition: spec.partition,
                offset,
            })
        })
        .collect()
}

/// Set of partition consumer tasks of one session.
///
/// There is no control surface besides the session's [`ShutdownSignal`];
/// the supervisor only launches tasks and waits for them.
pub struct ConsumerSupervisor {
    tracker: TaskTracker,
    launched: usize,
}

impl ConsumerSupervisor {
    /// Validate `config` and launch one task per consumer spec.
    ///
    /// Nothing is launched if any offset fails to resolve; the shutdown
    /// signal fires in that case. `tx` is consumed so the channel closes
    /// once every task has ended.
    pub fn launch(
        config: &SessionConfig,
        source: Arc<dyn PartitionSource>,
        tx: mpsc::Sender<ConsumedRecord>,
        shutdown: &ShutdownSignal,
    ) -> Result<Self, SessionError> {
        let targets = match resolve_targets(config) {
            Ok(targets) => targets,
            Err(e) => {
                shutdown.trigger(ShutdownReason::InvalidOffset);
                return Err(e);
            }
        };

        let launched = targets.len();
        let tracker = TaskTracker::new();
        for target in targets {
            tracing::debug!(%target, offset = %target.offset, "launching partition consumer");
            tracker.spawn(
                consume_partition(source.clone(), target, tx.clone(), shutdown.clone())
                    .in_current_span(),
            );
        }
        tracker.close();

        Ok(Self { tracker, launched })
    }

    /// Number of tasks launched.
    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Tasks still running.
    pub fn running(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every task has exited.
    pub async fn join(&self) {
        self.tracker.wait().await;
    }
}
