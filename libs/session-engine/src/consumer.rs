use std::sync::Arc;

use tokio::sync::mpsc;

use bridge_api::{ConsumedRecord, ErrorKind, PartitionSource, PartitionTarget, SourceError};

use crate::error::SessionError;
use crate::shutdown::{ShutdownReason, ShutdownSignal};

// ═══════════════════════════════════════════════════════════════
//  Partition consumer task: source → fan-in channel
// ═══════════════════════════════════════════════════════════════

/// Body of one partition consumer task.
///
/// Pulls records from `target` and pushes them, in partition order, onto
/// the shared channel until the session shuts down. A source failure fires
/// the shutdown signal for the whole session.
pub(crate) async fn consume_partition(
    source: Arc<dyn PartitionSource>,
    target: PartitionTarget,
    tx: mpsc::Sender<ConsumedRecord>,
    shutdown: ShutdownSignal,
) {
    match pump(&*source, &target, &tx, &shutdown).await {
        Ok(forwarded) => {
            tracing::info!(
                topic = %target.topic,
                partition = target.partition,
                forwarded,
                "partition consumer stopped"
            );
        }
        Err(e) => {
            let stage = match e.source_kind() {
                Some(ErrorKind::Fetch) => "streaming",
                _ => "attach",
            };
            tracing::error!(
                topic = %target.topic,
                partition = target.partition,
                broker = %target.broker,
                kind = ?e.source_kind(),
                stage,
                error = %e,
                "partition consumer failed"
            );
            shutdown.trigger(ShutdownReason::ConsumerFailed {
                topic: target.topic.clone(),
                partition: target.partition,
            });
        }
    }
}

/// Returns the number of records handed to the multiplexer.
async fn pump(
    source: &dyn PartitionSource,
    target: &PartitionTarget,
    tx: &mpsc::Sender<ConsumedRecord>,
    shutdown: &ShutdownSignal,
) -> Result<u64, SessionError> {
    let source_error = |e: SourceError| SessionError::ConsumerSource {
        topic: target.topic.clone(),
        partition: target.partition,
        source: e,
    };

    let mut stream = tokio::select! {
        biased;
        _ = shutdown.cancelled() => return Ok(0),
        opened = source.open(target) => opened.map_err(source_error)?,
    };
    tracing::info!(
        topic = %target.topic,
        partition = target.partition,
        offset = %target.offset,
        "partition consumer attached"
    );

    let mut forwarded = 0;
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(forwarded),
            next = stream.next() => next,
        };

        let record = match next {
            Some(Ok(record)) => record,
            Some(Err(e)) => return Err(source_error(e)),
            None => {
                tracing::info!(topic = %target.topic, partition = target.partition, "source ended");
                return Ok(forwarded);
            }
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(forwarded),
            sent = tx.send(record) => {
                // Receiver gone: the multiplexer already left the session.
                if sent.is_err() {
                    return Ok(forwarded);
                }
                forwarded += 1;
            }
        }
    }
}
