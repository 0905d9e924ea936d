//! Multipart boundary generation.

use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a multipart boundary.
///
/// The value combines the current time in nanoseconds with a process-wide
/// sequence number, so two boundaries generated within the same clock tick
/// still differ.
#[must_use]
pub fn generate_boundary() -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .unsigned_abs();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("mailgate-{nanos:x}-{seq:x}")
}
