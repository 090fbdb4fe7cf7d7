//! Record ID generation.

use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Fallback sequence used when the OS random source is unavailable.
static FALLBACK_SEQ: AtomicU32 = AtomicU32::new(0);

/// Generate a new record ID.
///
/// Format: `{timestamp_ms}-{random_hex}`. Unique enough for a single
/// device's collections; not a cryptographic identifier.
pub fn generate_id() -> String {
    let mut random = [0u8; 4];
    if getrandom::getrandom(&mut random).is_err() {
        let seq = FALLBACK_SEQ.fetch_add(1, Ordering::Relaxed);
        let nanos = Utc::now().timestamp_subsec_nanos();
        random = (seq ^ nanos).to_be_bytes();
    }

    format!("{}-{}", Utc::now().timestamp_millis(), hex::encode(random))
}
