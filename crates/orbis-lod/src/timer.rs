//! Fixed-interval scheduling for maintenance sweeps.

use std::time::{Duration, Instant};

/// Delay before the first sweep.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
/// Time between sweeps.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);

/// Decides when the next maintenance sweep is due.
///
/// [`poll`](Self::poll) fires at most once per call and re-arms relative to
/// the time it fired, so a slow sweep delays the next one instead of
/// queueing a backlog.
#[derive(Clone, Debug)]
pub struct MaintenanceTimer {
    interval: Duration,
    next: Instant,
}

impl MaintenanceTimer {
    /// Arm the timer at `now`.
    #[must_use]
    pub fn new(now: Instant, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            interval,
            next: now + initial_delay,
        }
    }

    /// Arm with the default delay and interval.
    #[must_use]
    pub fn with_defaults(now: Instant) -> Self {
        Self::new(now, DEFAULT_INITIAL_DELAY, DEFAULT_INTERVAL)
    }

    /// `true` if a sweep is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.interval;
        true
    }

    /// Time until the next sweep, zero if overdue.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Sweep interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waits_for_initial_delay() {
        let start = Instant::now();
        let mut timer = MaintenanceTimer::with_defaults(start);
        assert!(!timer.poll(start));
        assert!(!timer.poll(start + Duration::from_millis(999)));
        assert!(timer.poll(start + Duration::from_secs(1)));
    }

    #[test]
    fn test_fires_once_per_interval() {
        let start = Instant::now();
        let mut timer = MaintenanceTimer::new(start, Duration::ZERO, Duration::from_millis(250));
        assert!(timer.poll(start));
        assert!(!timer.poll(start + Duration::from_millis(100)));
        assert!(timer.poll(start + Duration::from_millis(250)));
        assert_eq!(timer.remaining(start + Duration::from_millis(300)), Duration::from_millis(200));
    }

    #[test]
    fn test_late_poll_does_not_backlog() {
        let start = Instant::now();
        let mut timer = MaintenanceTimer::new(start, Duration::ZERO, Duration::from_millis(250));
        let late = start + Duration::from_secs(5);
        assert!(timer.poll(late));
        assert!(!timer.poll(late), "a late sweep re-arms from when it ran");
        assert!(timer.poll(late + timer.interval()));
    }
}
