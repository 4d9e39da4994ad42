//! Monotonic microsecond timestamps.
//!
//! Pose stamps, latency accounting, and the liveness watchdog all share one
//! process-wide monotonic epoch, so the difference between any two
//! timestamps is meaningful regardless of which thread took them.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Microseconds elapsed since the first call in this process.
///
/// Backed by [`Instant`]: never goes backwards and is unaffected by
/// wall-clock adjustments.
#[inline]
pub fn monotonic_us() -> u64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_monotonic_us_advances() {
        let t0 = monotonic_us();
        thread::sleep(Duration::from_millis(2));
        let t1 = monotonic_us();
        assert!(t1 > t0);
    }
}
