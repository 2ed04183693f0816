/// Milliseconds on the monotonic clock since boot.
pub type Millis = u64;

pub const TICK_TIME_DELAY: Millis = 10;
pub const SENSOR_DELAY: Millis = 1000;

/// Time since `since`, or zero if the clock appears to have gone backwards.
pub fn elapsed(now: Millis, since: Millis) -> Millis {
    now.saturating_sub(since)
}

/// Fires at most once per `period`, measured from the last time it fired.
///
/// A gap of several periods between calls still only fires once; the next
/// period starts at the call that fired.
pub struct IntervalTimer {
    period: Millis,
    last: Option<Millis>,
}

impl IntervalTimer {
    pub const fn new(period: Millis) -> IntervalTimer {
        Self { period, last: None }
    }

    /// Returns true if the timer has never fired or more than `period` has
    /// passed since it last did.
    pub fn is_due(&self, now: Millis) -> bool {
        match self.last {
            None => true,
            Some(last) => elapsed(now, last) > self.period,
        }
    }

    /// Checks and, if due, rearms the timer at `now`.
    pub fn poll(&mut self, now: Millis) -> bool {
        if self.is_due(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_fires() {
        let mut timer = IntervalTimer::new(SENSOR_DELAY);
        assert!(timer.poll(0));
        assert!(!timer.poll(0));
    }

    #[test]
    fn fires_only_after_period_has_strictly_passed() {
        let mut timer = IntervalTimer::new(1000);
        assert!(timer.poll(500));
        assert!(!timer.poll(1500));
        assert!(timer.poll(1501));
        assert!(!timer.poll(2000));
    }

    #[test]
    fn long_gap_fires_once() {
        let mut timer = IntervalTimer::new(1000);
        assert!(timer.poll(0));
        assert!(timer.poll(60_000));
        assert!(!timer.poll(60_500));
    }

    #[test]
    fn elapsed_never_underflows() {
        assert_eq!(elapsed(5, 10), 0);
        assert_eq!(elapsed(10, 5), 5);
    }
}
