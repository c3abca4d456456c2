//! Fixed-period sample pacing.
//!
//! The next slot is measured from the previous *actual* sample, so a slow
//! iteration delays the phase but never triggers a burst of catch-up samples.
use std::time::{Duration, Instant};

use torque_traits::Clock;

use crate::config::SessionConfig;

/// Monotonic timestamps for one logging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    origin: Instant,
    last_sample: Instant,
    last_flush: Instant,
}

impl SessionClock {
    /// All three marks set to `now`.
    pub fn start(now: Instant) -> Self {
        Self {
            origin: now,
            last_sample: now,
            last_flush: now,
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }
    pub fn last_sample(&self) -> Instant {
        self.last_sample
    }
    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }

    /// Whole milliseconds between the session origin and `now`.
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        let d = now.saturating_duration_since(self.origin);
        u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
    }

    pub(crate) fn mark_sample(&mut self, now: Instant) {
        self.last_sample = now;
    }

    pub(crate) fn mark_flush(&mut self, now: Instant) {
        self.last_flush = now;
    }
}

/// Time left in the current period; zero once the period has been used up.
#[inline]
pub fn remaining_us(interval_us: u64, since_last_us: u64) -> u64 {
    interval_us.saturating_sub(since_last_us)
}

/// Idle until one sample period has passed since the last sample, then stamp
/// the new sample time. Returns how long it idled.
pub fn wait_for_next_slot(
    clock: &dyn Clock,
    session: &mut SessionClock,
    config: &SessionConfig,
) -> Duration {
    let since_last = clock.us_since(session.last_sample());
    let remaining = remaining_us(config.sample_interval_us(), since_last);
    let idled = Duration::from_micros(remaining);
    if remaining > 0 {
        clock.sleep(idled);
    }
    session.mark_sample(clock.now());
    idled
}
