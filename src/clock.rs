//! Time sources for the task list.
//!
//! The controller needs two notions of time: local wall-clock time, for task
//! ids and due-date classification, and a monotonic instant for deferred work.
//! Both come through the `Clock` trait so tests can drive them by hand.

use std::cell::Cell;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};

pub trait Clock {
    /// Current local date and time.
    fn local_now(&self) -> NaiveDateTime;

    /// Milliseconds since the Unix epoch, used to stamp new task ids.
    fn epoch_millis(&self) -> i64;

    /// Monotonic time for scheduling.
    fn instant(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn epoch_millis(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start_local: NaiveDateTime,
    start_instant: Instant,
    elapsed: Cell<Duration>,
}

impl ManualClock {
    pub fn new(local_now: NaiveDateTime) -> Self {
        ManualClock {
            start_local: local_now,
            start_instant: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    /// Move both wall-clock and monotonic time forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Clock for ManualClock {
    fn local_now(&self) -> NaiveDateTime {
        self.start_local + chrono::Duration::from_std(self.elapsed.get()).unwrap_or(chrono::TimeDelta::MAX)
    }

    fn epoch_millis(&self) -> i64 {
        self.local_now().and_utc().timestamp_millis()
    }

    fn instant(&self) -> Instant {
        self.start_instant + self.elapsed.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn local_now(&self) -> NaiveDateTime {
        (**self).local_now()
    }

    fn epoch_millis(&self) -> i64 {
        (**self).epoch_millis()
    }

    fn instant(&self) -> Instant {
        (**self).instant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_manual_clock_advances_both_timelines() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let t0 = clock.instant();
        let ms0 = clock.epoch_millis();

        clock.advance(Duration::from_millis(1500));

        assert_eq!(clock.instant() - t0, Duration::from_millis(1500));
        assert_eq!(clock.epoch_millis() - ms0, 1500);
        assert_eq!(clock.local_now(), start + chrono::Duration::milliseconds(1500));
    }
}
