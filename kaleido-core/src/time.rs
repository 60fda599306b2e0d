//! Millisecond tick arithmetic
//!
//! Timestamps are free-running `u32` milliseconds that wrap roughly every
//! 49.7 days. Elapsed times are always computed with wrapping subtraction
//! so timers keep working across the wrap.

/// Milliseconds elapsed from `since` to `now`, tolerant of wraparound
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Check whether `duration_ms` has passed since `since`
#[inline]
pub fn has_elapsed(now: u32, since: u32, duration_ms: u32) -> bool {
    elapsed_ms(now, since) >= duration_ms
}
