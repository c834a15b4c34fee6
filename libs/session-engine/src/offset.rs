use bridge_api::StartOffset;

use crate::error::SessionError;

/// Descriptor for the oldest retained record.
pub const OLDEST: &str = "oldest";
/// Descriptor for the next record to be produced.
pub const NEWEST: &str = "newest";

/// Map a client offset descriptor to a start position.
///
/// Integers are literal positions; `-2` and `-1` are accepted as the raw
/// sentinels of `oldest` and `newest`. Any other negative number or
/// unknown token is rejected.
pub fn resolve_offset(descriptor: &str) -> Result<StartOffset, SessionError> {
    if let Ok(raw) = descriptor.parse::<i64>() {
        return StartOffset::from_raw(raw)
            .ok_or_else(|| SessionError::InvalidOffsetDescriptor(descriptor.to_string()));
    }
    match descriptor {
        OLDEST => Ok(StartOffset::Earliest),
        NEWEST => Ok(StartOffset::Latest),
        _ => Err(SessionError::InvalidOffsetDescriptor(descriptor.to_string())),
    }
}
