use std::time::Duration;

use serde::Deserialize;

use crate::error::SessionError;

// ════════════════════════════════════════════════════════════════
//  Handshake payload
// ════════════════════════════════════════════════════════════════

/// Configuration sent by the client as the first frame of a session.
///
/// ```json
/// {"consumers":[{"broker":"localhost:9092","topic":"t","partition":0,"offset":"newest"}]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub consumers: Vec<ConsumerSpec>,
}

/// One partition to tail.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsumerSpec {
    pub broker: String,
    pub topic: String,
    pub partition: i32,
    /// Integer position, `"oldest"` or `"newest"`. Resolved by
    /// [`crate::resolve_offset`].
    pub offset: String,
}

impl SessionConfig {
    /// Decode and validate a handshake payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, SessionError> {
        let config: SessionConfig = serde_json::from_slice(payload)
            .map_err(|e| SessionError::ConfigReceive(format!("parse: {e}")))?;

        for spec in &config.consumers {
            if spec.partition < 0 {
                return Err(SessionError::ConfigReceive(format!(
                    "partition must be non-negative, got {} for topic '{}'",
                    spec.partition, spec.topic
                )));
            }
        }
        Ok(config)
    }
}

// ════════════════════════════════════════════════════════════════
//  Server-side options
// ════════════════════════════════════════════════════════════════

/// Per-session tuning, fixed for the lifetime of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Capacity of the fan-in channel. Producers block when it is full.
    pub channel_buffer: usize,
    /// How long to wait for the handshake frame. `None` = forever.
    pub handshake_timeout: Option<Duration>,
    /// Upper bound on a single outbound write or close. `None` = forever.
    pub send_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            channel_buffer: 256,
            handshake_timeout: None,
            send_timeout: None,
        }
    }
}
