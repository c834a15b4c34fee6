use serde::Serialize;

use bridge_api::ConsumedRecord;

/// Outbound event, one per consumed record.
///
/// Every field is a string, numeric ones included.
#[derive(Debug, Serialize)]
pub struct WireEvent<'a> {
    pub topic: &'a str,
    pub partition: String,
    pub offset: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "consumedUnixTimestamp")]
    pub consumed_unix_timestamp: String,
}

impl<'a> From<&'a ConsumedRecord> for WireEvent<'a> {
    fn from(record: &'a ConsumedRecord) -> Self {
        Self {
            topic: &record.topic,
            partition: record.partition.to_string(),
            offset: record.offset.to_string(),
            key: String::from_utf8_lossy(&record.key).into_owned(),
            value: String::from_utf8_lossy(&record.value).into_owned(),
            consumed_unix_timestamp: record.consumed_at.to_string(),
        }
    }
}

/// Serialize `record` as one newline-terminated JSON line.
pub fn encode_event(record: &ConsumedRecord) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(&WireEvent::from(record))?;
    line.push('\n');
    Ok(line)
}
