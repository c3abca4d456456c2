//! Common time/period helpers for torque_core.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Compute the sample period in microseconds for a given rate in Hz.
///
/// Integer division, truncating. Debug builds assert `hz > 0`; release
/// builds clamp to 1 Hz instead of dividing by zero.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    debug_assert!(hz > 0, "sample_rate_hz must be > 0");
    MICROS_PER_SEC / u64::from(hz.max(1))
}

/// Convert a whole number of seconds to microseconds, saturating.
#[inline]
pub fn secs_to_us(secs: u32) -> u64 {
    u64::from(secs).saturating_mul(MICROS_PER_SEC)
}
