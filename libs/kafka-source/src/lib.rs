//! [`PartitionSource`] over librdkafka.
//!
//! Each partition task gets its own `StreamConsumer` with a manual
//! single-partition assignment; no consumer group coordination, no
//! offset commits.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::{Offset, TopicPartitionList};
use serde::Deserialize;

use bridge_api::{
    ConsumedRecord, PartitionSource, PartitionTarget, RecordStream, SourceError, StartOffset,
    unix_now_secs,
};

// ════════════════════════════════════════════════════════════════
//  Config
// ════════════════════════════════════════════════════════════════

/// Client settings shared by every partition consumer of the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KafkaSourceConfig {
    /// `client.id` and prefix of the generated `group.id`.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Upper bound on the metadata probe run when a partition is opened.
    #[serde(default = "default_metadata_timeout_ms")]
    pub metadata_timeout_ms: u64,
    /// Extra librdkafka properties (security, fetch tuning, ...). Applied
    /// last, so they override the built-in settings.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_client_id() -> String {
    "flowbro".into()
}
fn default_metadata_timeout_ms() -> u64 {
    5000
}

impl Default for KafkaSourceConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            metadata_timeout_ms: default_metadata_timeout_ms(),
            properties: BTreeMap::new(),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Source
// ════════════════════════════════════════════════════════════════

pub struct KafkaPartitionSource {
    config: KafkaSourceConfig,
}

impl KafkaPartitionSource {
    pub fn new(config: KafkaSourceConfig) -> Self {
        Self { config }
    }

    fn client_config(&self, target: &PartitionTarget) -> ClientConfig {
        let mut cfg = ClientConfig::new();
        cfg.set("bootstrap.servers", &target.broker)
            .set("client.id", &self.config.client_id)
            .set("group.id", format!("{}-{}", self.config.client_id, uuid::Uuid::new_v4()))
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false")
            // Out-of-range literal offsets surface as errors instead of
            // silently jumping to another position.
            .set("auto.offset.reset", "error");
        for (key, value) in &self.config.properties {
            cfg.set(key, value);
        }
        cfg
    }

    async fn attach(&self, target: PartitionTarget) -> Result<Box<dyn RecordStream>, SourceError> {
        let consumer: StreamConsumer = self
            .client_config(&target)
            .create()
            .map_err(|e| SourceError::config(format!("create consumer: {e}")))?;
        let consumer = Arc::new(consumer);

        let probe = consumer.clone();
        let topic = target.topic.clone();
        let partition = target.partition;
        let timeout = Duration::from_millis(self.config.metadata_timeout_ms);
        tokio::task::spawn_blocking(move || probe_partition(&probe, &topic, partition, timeout))
            .await
            .map_err(|e| SourceError::connect(format!("metadata probe: {e}")))??;

        let mut assignment = TopicPartitionList::new();
        assignment
            .add_partition_offset(&target.topic, target.partition, kafka_offset(target.offset))
            .map_err(|e| SourceError::config(format!("offset {}: {e}", target.offset)))?;
        consumer
            .assign(&assignment)
            .map_err(|e| SourceError::connect(format!("assign: {e}")))?;

        tracing::debug!(%target, offset = %target.offset, "kafka partition assigned");
        Ok(Box::new(KafkaRecordStream { consumer }))
    }
}

impl PartitionSource for KafkaPartitionSource {
    fn open(
        &self,
        target: &PartitionTarget,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn RecordStream>, SourceError>> + Send + '_>> {
        let target = target.clone();
        Box::pin(async move {
            let label = target.to_string();
            self.attach(target).await.map_err(|e| e.with_context(label))
        })
    }
}

/// Fail fast when the broker is unreachable or the partition does not
/// exist. Blocking: run off the async runtime.
fn probe_partition(
    consumer: &StreamConsumer,
    topic: &str,
    partition: i32,
    timeout: Duration,
) -> Result<(), SourceError> {
    let metadata = consumer
        .fetch_metadata(Some(topic), timeout)
        .map_err(|e| SourceError::connect(format!("fetch metadata: {e}")))?;

    let meta_topic = metadata
        .topics()
        .iter()
        .find(|t| t.name() == topic)
        .ok_or_else(|| SourceError::connect(format!("topic '{topic}' not in metadata")))?;
    if let Some(err) = meta_topic.error() {
        return Err(SourceError::connect(format!("topic '{topic}': {err:?}")));
    }
    if !meta_topic.partitions().iter().any(|p| p.id() == partition) {
        return Err(SourceError::connect(format!(
            "topic '{topic}' has no partition {partition} ({} partitions)",
            meta_topic.partitions().len()
        )));
    }
    Ok(())
}

pub fn kafka_offset(offset: StartOffset) -> Offset {
    match offset {
        StartOffset::Earliest => Offset::Beginning,
        StartOffset::Latest => Offset::End,
        StartOffset::At(n) => Offset::Offset(n),
    }
}

// ════════════════════════════════════════════════════════════════
//  Stream
// ════════════════════════════════════════════════════════════════

struct KafkaRecordStream {
    consumer: Arc<StreamConsumer>,
}

impl RecordStream for KafkaRecordStream {
    fn next(&mut self) -> Pin<Box<dyn Future<Output = Option<Result<ConsumedRecord, SourceError>>> + Send + '_>> {
        Box::pin(async move {
            match self.consumer.recv().await {
                Ok(msg) => Some(Ok(ConsumedRecord {
                    topic: msg.topic().to_string(),
                    partition: msg.partition(),
                    offset: msg.offset(),
                    key: msg.key().map(<[u8]>::to_vec).unwrap_or_default(),
                    value: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                    consumed_at: unix_now_secs(),
                })),
                Err(e) => Some(Err(SourceError::fetch(format!("receive: {e}")))),
            }
        })
    }
}
