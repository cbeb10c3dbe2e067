//! Time source for store timestamps.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Supplies "now" to every command that stamps a timestamp.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep one handle and give
/// the other to the store.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.set(instant);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::epoch;

    #[test]
    fn test_manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(epoch());
        let handle = clock.clone();
        handle.advance(Duration::minutes(5));
        assert_eq!(clock.now(), epoch() + Duration::minutes(5));

        clock.set(epoch());
        assert_eq!(handle.now(), epoch());
    }
}
