//! Threshold alerting with a confirmation delay, repeat throttling and a
//! single all-clear per episode.
//!
//! ```text
//!            any probe low               low for >= confirm_delay
//!  Normal ─────────────────► Unconfirmed ─────────────────────────► Alerting
//!    ▲                           │                                   │   ▲
//!    │      both probes back     │                                   │   │ repeat_interval
//!    └───────────────────────────┘                                   │   │ passed: follow-up
//!    ▲                                                               └───┘
//!    │              both probes back (emits the all-clear)           │
//!    └───────────────────────────────────────────────────────────────┘
//! ```

use crate::event::{Message, NotificationEvent};
use crate::preferences::Preferences;
use crate::sensors::ReadingPair;
use crate::timer::{elapsed, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertState {
    /// Both probes in spec.
    Normal,
    /// A probe has been out of spec since `since`; nothing sent yet.
    Unconfirmed { since: Millis },
    /// Alert sent; `last_sent` is when the most recent one went out.
    Alerting { since: Millis, last_sent: Millis },
}

impl AlertState {
    pub fn entered_out_of_spec_at(&self) -> Option<Millis> {
        match *self {
            AlertState::Normal => None,
            AlertState::Unconfirmed { since } | AlertState::Alerting { since, .. } => Some(since),
        }
    }

    pub fn last_alert_sent_at(&self) -> Option<Millis> {
        match *self {
            AlertState::Alerting { last_sent, .. } => Some(last_sent),
            _ => None,
        }
    }
}

pub struct AlertEngine {
    threshold: f32,
    confirm_delay: Millis,
    repeat_interval: Millis,
    state: AlertState,
}

impl AlertEngine {
    pub fn new(preferences: &Preferences) -> AlertEngine {
        Self {
            threshold: preferences.threshold,
            confirm_delay: preferences.confirm_delay,
            repeat_interval: preferences.repeat_interval,
            state: AlertState::Normal,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Advances the state machine by one tick. Returns at most one
    /// notification.
    pub fn evaluate(&mut self, readings: &ReadingPair, now: Millis) -> Option<NotificationEvent> {
        if readings.any_out_of_spec(self.threshold) {
            self.out_of_spec(readings, now)
        } else {
            self.in_spec(readings)
        }
    }

    fn out_of_spec(&mut self, readings: &ReadingPair, now: Millis) -> Option<NotificationEvent> {
        match self.state {
            AlertState::Normal => {
                debug!("out of spec at {=u64}, waiting for confirmation", now);
                self.state = AlertState::Unconfirmed { since: now };
                None
            }
            AlertState::Unconfirmed { since } => {
                if elapsed(now, since) < self.confirm_delay {
                    return None;
                }
                info!("temperature alert confirmed after {=u64}ms", elapsed(now, since));
                self.state = AlertState::Alerting {
                    since,
                    last_sent: now,
                };
                Some(NotificationEvent::new(Message::TemperatureAlert, *readings))
            }
            AlertState::Alerting { since, last_sent } => {
                if elapsed(now, last_sent) < self.repeat_interval {
                    return None;
                }
                info!("follow-up temperature alert");
                self.state = AlertState::Alerting {
                    since,
                    last_sent: now,
                };
                Some(NotificationEvent::new(Message::FollowupAlert, *readings))
            }
        }
    }

    fn in_spec(&mut self, readings: &ReadingPair) -> Option<NotificationEvent> {
        let previous = core::mem::replace(&mut self.state, AlertState::Normal);
        match previous {
            AlertState::Alerting { .. } => {
                info!("normal temperature resumed");
                Some(NotificationEvent::new(Message::NormalResumed, *readings))
            }
            AlertState::Unconfirmed { .. } => {
                debug!("back in spec before confirmation");
                None
            }
            AlertState::Normal => None,
        }
    }
}
