//! Millisecond wall-clock timestamps used across entity types.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// Entities stamp `created_at`/`updated_at` with this; the remote store may
/// later overwrite them with its own server-assigned timestamps.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
