//! Timestamp sources. Timestamps are nanoseconds since the UNIX epoch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub type Timestamp = u64;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Live wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(saturating_nanos)
            .unwrap_or(0)
    }
}

/// Nanoseconds in `d`, pinned at `u64::MAX` instead of wrapping.
fn saturating_nanos(d: Duration) -> Timestamp {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Advances by `step` on every read, starting at `start`.
#[derive(Debug)]
pub struct SteppingClock {
    next: AtomicU64,
    step: u64,
}

impl SteppingClock {
    pub fn new(start: Timestamp, step: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Timestamp {
        self.next.fetch_add(self.step, Ordering::Relaxed)
    }
}

impl<F> Clock for F
where
    F: Fn() -> Timestamp + Send + Sync,
{
    fn now(&self) -> Timestamp {
        self()
    }
}

/// Current wall-clock time in nanoseconds.
pub fn now() -> Timestamp {
    SystemClock.now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800_000_000_000);
    }

    #[test]
    fn nanos_saturate_instead_of_wrapping() {
        assert_eq!(saturating_nanos(Duration::from_secs(2)), 2_000_000_000);
        assert_eq!(saturating_nanos(Duration::MAX), u64::MAX);
        assert_eq!(
            saturating_nanos(Duration::from_nanos(u64::MAX) + Duration::from_nanos(1)),
            u64::MAX
        );
    }

    #[test]
    fn stepping_clock_advances() {
        let clock = SteppingClock::new(10, 5);
        assert_eq!(clock.now(), 10);
        assert_eq!(clock.now(), 15);
        assert_eq!(clock.now(), 20);
    }

    #[test]
    fn closures_are_clocks() {
        let clock = || 42u64;
        assert_eq!(Clock::now(&clock), 42);
        assert_eq!(FixedClock(7).now(), 7);
    }
}
