//! Screen wake gate: on with a press, off after a fixed timeout.

use crate::timer::{elapsed, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayWakeState {
    pub is_on: bool,
    pub turned_on_at: Millis,
}

/// Tracks whether the screen should be lit.
pub struct DisplayWake {
    timeout: Millis,
    state: DisplayWakeState,
}

impl DisplayWake {
    pub fn new(timeout: Millis) -> DisplayWake {
        Self {
            timeout,
            state: DisplayWakeState {
                is_on: false,
                turned_on_at: 0,
            },
        }
    }

    pub fn state(&self) -> DisplayWakeState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on
    }

    /// Turns the screen on (or keeps it on) and restarts the timeout.
    pub fn wake(&mut self, now: Millis) {
        if !self.state.is_on {
            debug!("display on");
        }
        self.state = DisplayWakeState {
            is_on: true,
            turned_on_at: now,
        };
    }

    /// Applies an optional wake request, then the timeout. Returns whether
    /// the screen is on after this tick.
    pub fn update(&mut self, wake_requested: bool, now: Millis) -> bool {
        if wake_requested {
            self.wake(now);
        }
        if self.state.is_on && elapsed(now, self.state.turned_on_at) > self.timeout {
            debug!("display off (timeout)");
            self.state.is_on = false;
        }
        self.state.is_on
    }
}
