//! Millisecond ↔ (seconds, nanos) conversion for the wire's
//! `Timestamp`/`Duration` shapes.
//!
//! The logical clock and all timer timeouts are integer milliseconds, so
//! the conversion is exact in both directions for `ms >= 0`. Sub-millisecond
//! nanos on ingress are truncated.

use crate::error::TimeError;

const NANOS_PER_MILLI: i32 = 1_000_000;
const MILLIS_PER_SECOND: u64 = 1_000;

/// Split milliseconds into the wire's `(seconds, nanos)` pair.
pub fn millis_to_parts(millis: u64) -> (i64, i32) {
    let seconds = (millis / MILLIS_PER_SECOND) as i64;
    let nanos = (millis % MILLIS_PER_SECOND) as i32 * NANOS_PER_MILLI;
    (seconds, nanos)
}

/// Fold a wire `(seconds, nanos)` pair back into milliseconds.
///
/// Negative components and nanos outside `[0, 1s)` are out of range; the
/// protocol never carries them for timestamps or timer timeouts.
pub fn parts_to_millis(seconds: i64, nanos: i32) -> Result<u64, TimeError> {
    if seconds < 0 || !(0..1_000_000_000).contains(&nanos) {
        return Err(TimeError::OutOfRange { seconds, nanos });
    }
    (seconds as u64)
        .checked_mul(MILLIS_PER_SECOND)
        .and_then(|ms| ms.checked_add((nanos / NANOS_PER_MILLI) as u64))
        .ok_or(TimeError::OutOfRange { seconds, nanos })
}
