//! Single-button press/hold handling.
//!
//! The button is sampled once per tick. A press edge wakes the screen;
//! holding past the secondary delay sends one test notification, holding
//! past the restart delay asks for a restart. Releasing always returns to
//! [`ButtonState::Idle`].

use embedded_hal::digital::InputPin;
use heapless::Vec;

use crate::event::{Message, NotificationEvent};
use crate::preferences::Preferences;
use crate::sensors::ReadingPair;
use crate::timer::{elapsed, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    Idle,
    /// Held down since `since`. Each hold action fires once per press.
    Held {
        since: Millis,
        secondary_sent: bool,
        restart_requested: bool,
    },
}

impl ButtonState {
    pub fn lockout_started_at(&self) -> Option<Millis> {
        match *self {
            ButtonState::Idle => None,
            ButtonState::Held { since, .. } => Some(since),
        }
    }

    pub fn secondary_action_sent(&self) -> bool {
        matches!(
            self,
            ButtonState::Held {
                secondary_sent: true,
                ..
            }
        )
    }
}

/// What one tick of button handling produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ButtonOutput {
    /// Set only on the tick the button goes down.
    pub wake: bool,
    /// Test notification and/or restart notice, in that order.
    pub events: Vec<NotificationEvent, 2>,
    /// The device must restart once `events` have been handed off.
    pub restart: bool,
}

pub struct ButtonEngine {
    secondary_action_delay: Millis,
    restart_delay: Millis,
    state: ButtonState,
}

impl ButtonEngine {
    pub fn new(preferences: &Preferences) -> ButtonEngine {
        Self {
            secondary_action_delay: preferences.secondary_action_delay,
            restart_delay: preferences.restart_delay,
            state: ButtonState::Idle,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Feeds one raw level sample (true = pressed).
    pub fn update(&mut self, pressed: bool, now: Millis) -> ButtonOutput {
        let mut output = ButtonOutput::default();

        if !pressed {
            if self.state != ButtonState::Idle {
                info!("button released");
            }
            self.state = ButtonState::Idle;
            return output;
        }

        match &mut self.state {
            ButtonState::Idle => {
                info!("button pressed, waking display");
                self.state = ButtonState::Held {
                    since: now,
                    secondary_sent: false,
                    restart_requested: false,
                };
                output.wake = true;
            }
            ButtonState::Held {
                since,
                secondary_sent,
                restart_requested,
            } => {
                let held_for = elapsed(now, *since);
                // Info events carry no readings.
                let payload = ReadingPair::uniform(0.0, now);

                if held_for > self.secondary_action_delay && !*secondary_sent {
                    info!("button held {=u64}ms: sending test notification", held_for);
                    *secondary_sent = true;
                    // Capacity is two and this is the first push.
                    let _ = output
                        .events
                        .push(NotificationEvent::new(Message::TestNotification, payload));
                }

                if held_for > self.restart_delay && !*restart_requested {
                    warn!("button held {=u64}ms: soft restart", held_for);
                    *restart_requested = true;
                    let _ = output
                        .events
                        .push(NotificationEvent::new(Message::SoftRestart, payload));
                    output.restart = true;
                }
            }
        }

        output
    }
}

/// Samples an active-high button. A pin that can't be read counts as
/// released.
pub fn read_level<P: InputPin>(pin: &mut P) -> bool {
    pin.is_high().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ButtonEngine {
        ButtonEngine::new(&Preferences::default())
    }

    fn messages(output: &ButtonOutput) -> std::vec::Vec<Message> {
        output.events.iter().map(|e| e.message).collect()
    }

    #[test]
    fn press_edge_wakes_once() {
        let mut button = engine();
        let wakes = (0..10)
            .map(|tick| button.update(true, tick * 10))
            .filter(|output| output.wake)
            .count();
        assert_eq!(wakes, 1);
        assert_eq!(button.state().lockout_started_at(), Some(0));
    }

    #[test]
    fn holding_past_secondary_delay_sends_one_test() {
        let mut button = engine();
        button.update(true, 0);
        assert!(button.update(true, 4000).events.is_empty());

        let output = button.update(true, 4001);
        assert_eq!(messages(&output), [Message::TestNotification]);
        assert!(!output.restart);
        assert!(button.state().secondary_action_sent());

        assert!(button.update(true, 4500).events.is_empty());
        assert!(button.update(true, 19_000).events.is_empty());
    }

    #[test]
    fn holding_past_restart_delay_restarts_once() {
        let mut button = engine();
        button.update(true, 0);
        button.update(true, 4001);
        assert!(!button.update(true, 20_000).restart);

        let output = button.update(true, 20_001);
        assert_eq!(messages(&output), [Message::SoftRestart]);
        assert!(output.restart);

        assert!(!button.update(true, 20_100).restart);
    }

    #[test]
    fn single_late_sample_sends_test_then_restart() {
        let mut button = engine();
        button.update(true, 0);
        let output = button.update(true, 25_000);
        assert_eq!(
            messages(&output),
            [Message::TestNotification, Message::SoftRestart]
        );
        assert!(output.restart);
    }

    #[test]
    fn release_resets_hold() {
        let mut button = engine();
        button.update(true, 0);
        button.update(true, 4001);
        button.update(false, 4100);
        assert_eq!(button.state(), ButtonState::Idle);
        assert_eq!(button.state().lockout_started_at(), None);

        assert!(button.update(true, 5000).wake);
        assert!(!button.state().secondary_action_sent());
        assert!(button.update(true, 9000).events.is_empty());
        assert_eq!(
            messages(&button.update(true, 9001)),
            [Message::TestNotification]
        );
    }

    #[test]
    fn info_events_carry_zero_payload() {
        let mut button = engine();
        button.update(true, 0);
        let output = button.update(true, 4001);
        assert_eq!(output.events[0].payload.first.value, 0.0);
        assert_eq!(output.events[0].payload.second.value, 0.0);
    }

    struct FakePin(Result<bool, ()>);

    #[derive(Debug)]
    struct PinFault;

    impl embedded_hal::digital::Error for PinFault {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = PinFault;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, PinFault> {
            self.0.map_err(|_| PinFault)
        }

        fn is_low(&mut self) -> Result<bool, PinFault> {
            self.is_high().map(|high| !high)
        }
    }

    #[test]
    fn unreadable_pin_counts_as_released() {
        assert!(read_level(&mut FakePin(Ok(true))));
        assert!(!read_level(&mut FakePin(Ok(false))));
        assert!(!read_level(&mut FakePin(Err(()))));
    }
}
