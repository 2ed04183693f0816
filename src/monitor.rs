//! One pass of the main loop.
//!
//! [`Monitor`] owns every piece of state and is driven by a single
//! [`Monitor::tick`] call per loop pass. The current time and button level
//! are captured once by the caller so both engines see the same values.

use heapless::{String, Vec};
use ufmt::uWrite;

use crate::alert::{AlertEngine, AlertState};
use crate::bridge::ADDRESS_CAPACITY;
use crate::button::{ButtonEngine, ButtonState};
use crate::clock::WallClock;
use crate::display::{DisplayWake, DisplayWakeState};
use crate::event::NotificationEvent;
use crate::http::write_response;
use crate::notify::Notifier;
use crate::preferences::Preferences;
use crate::rendering::{render_frame, Frame};
use crate::sensors::{refresh, ReadingPair, SensorSource};
use crate::timer::{IntervalTimer, Millis};

/// The local screen.
pub trait StatusDisplay {
    fn set_wake(&mut self, on: bool);
    fn render(&mut self, frame: &Frame);
}

/// What the firmware must do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    Continue,
    /// Reset the device now. Notifications for this tick have been sent.
    Restart,
}

pub struct Monitor {
    preferences: Preferences,
    alerts: AlertEngine,
    button: ButtonEngine,
    wake: DisplayWake,
    clock: WallClock,
    sensor_timer: IntervalTimer,
    latest: ReadingPair,
    address: Option<String<ADDRESS_CAPACITY>>,
}

impl Monitor {
    pub fn new(preferences: Preferences) -> Monitor {
        Self {
            alerts: AlertEngine::new(&preferences),
            button: ButtonEngine::new(&preferences),
            wake: DisplayWake::new(preferences.display_timeout),
            clock: WallClock::new(preferences.local_offset_secs()),
            sensor_timer: IntervalTimer::new(preferences.sensor_poll),
            // In spec until the probes say otherwise
            latest: ReadingPair::uniform(preferences.threshold, 0),
            address: None,
            preferences,
        }
    }

    pub fn readings(&self) -> &ReadingPair {
        &self.latest
    }

    pub fn alert_state(&self) -> AlertState {
        self.alerts.state()
    }

    pub fn button_state(&self) -> ButtonState {
        self.button.state()
    }

    pub fn display_state(&self) -> DisplayWakeState {
        self.wake.state()
    }

    /// Where the status page can be reached, shown on the screen.
    pub fn set_address(&mut self, address: &str) {
        let mut stored = String::new();
        for c in address.chars() {
            if stored.push(c).is_err() {
                break;
            }
        }
        self.address = Some(stored);
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Anchors the wall clock to network time.
    pub fn sync_clock(&mut self, unix_secs: i64, now: Millis) {
        self.clock.sync(unix_secs, now);
    }

    /// Runs every engine once.
    pub fn tick<S, N, D>(
        &mut self,
        now: Millis,
        button_level: bool,
        sensors: &mut S,
        notifier: &mut N,
        display: &mut D,
    ) -> Control
    where
        S: SensorSource,
        N: Notifier,
        D: StatusDisplay,
    {
        if self.sensor_timer.poll(now) {
            let updated = refresh(sensors, &mut self.latest, now);
            trace!(
                "polled {=usize} probes: {} {}",
                updated,
                self.latest.first.value,
                self.latest.second.value
            );
        }
        let readings = self.latest;

        let mut events: Vec<NotificationEvent, 3> = Vec::new();
        if let Some(event) = self.alerts.evaluate(&readings, now) {
            let _ = events.push(event);
        }

        let pressed = self.button.update(button_level, now);
        for event in pressed.events.iter() {
            let _ = events.push(*event);
        }

        let display_on = self.wake.update(pressed.wake, now);

        if !events.is_empty() {
            let time = self.clock.now(now);
            for event in events.iter() {
                if let Err(e) = notifier.send(event, &time) {
                    warn!("notification {} not delivered: {}", event.message, e);
                }
            }
        }

        display.set_wake(display_on);
        display.render(&render_frame(
            &readings,
            self.alerts.threshold(),
            &self.clock.now(now),
            self.address(),
        ));

        if pressed.restart {
            error!("restart requested from button");
            Control::Restart
        } else {
            Control::Continue
        }
    }

    /// Writes the status page response for the latest readings.
    pub fn serve_status<W: uWrite + ?Sized>(&self, w: &mut W, now: Millis) -> Result<(), W::Error> {
        write_response(
            w,
            &self.latest,
            self.preferences.threshold,
            &self.clock.now(now),
            self.preferences.page_refresh_secs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::DateTime;
    use crate::error::{NotifyError, SensorError};
    use crate::event::Message;
    use crate::sensors::{Channel, Reading};

    struct Probes(f32, f32);

    impl SensorSource for Probes {
        fn poll(&mut self, channel: Channel, now: Millis) -> Result<Reading, SensorError> {
            let value = match channel {
                Channel::Sensor1 => self.0,
                Channel::Sensor2 => self.1,
            };
            Ok(Reading::new(channel, value, now))
        }
    }

    #[derive(Default)]
    struct Outbox(std::vec::Vec<Message>);

    impl Notifier for Outbox {
        fn send(&mut self, event: &NotificationEvent, _time: &DateTime) -> Result<(), NotifyError> {
            self.0.push(event.message);
            Err(NotifyError::Connect)
        }
    }

    #[derive(Default)]
    struct Screen {
        on: bool,
        frames: usize,
    }

    impl StatusDisplay for Screen {
        fn set_wake(&mut self, on: bool) {
            self.on = on;
        }

        fn render(&mut self, _frame: &Frame) {
            self.frames += 1;
        }
    }

    #[test]
    fn sensors_are_polled_on_cadence_only() {
        let mut monitor = Monitor::new(Preferences::default());
        let (mut outbox, mut screen) = (Outbox::default(), Screen::default());

        monitor.tick(0, false, &mut Probes(40.0, 41.0), &mut outbox, &mut screen);
        assert_eq!(monitor.readings().first.value, 40.0);

        monitor.tick(500, false, &mut Probes(30.0, 31.0), &mut outbox, &mut screen);
        assert_eq!(monitor.readings().first.value, 40.0);

        monitor.tick(1001, false, &mut Probes(30.0, 31.0), &mut outbox, &mut screen);
        assert_eq!(monitor.readings().second.value, 31.0);
        assert_eq!(screen.frames, 3);
    }

    #[test]
    fn failed_delivery_is_not_retried() {
        let mut monitor = Monitor::new(Preferences::default());
        let (mut outbox, mut screen) = (Outbox::default(), Screen::default());
        let mut probes = Probes(-2.0, 41.0);

        for now in (0..=12_000).step_by(100) {
            monitor.tick(now, false, &mut probes, &mut outbox, &mut screen);
        }
        assert_eq!(outbox.0, [Message::TemperatureAlert]);
        assert_eq!(monitor.alert_state().last_alert_sent_at(), Some(10_000));
    }

    #[test]
    fn restart_is_returned_after_notice_is_sent() {
        let mut monitor = Monitor::new(Preferences::default());
        let (mut outbox, mut screen) = (Outbox::default(), Screen::default());
        let mut probes = Probes(40.0, 41.0);

        assert_eq!(
            monitor.tick(0, true, &mut probes, &mut outbox, &mut screen),
            Control::Continue
        );
        assert!(screen.on);
        assert_eq!(
            monitor.tick(20_001, true, &mut probes, &mut outbox, &mut screen),
            Control::Restart
        );
        assert_eq!(outbox.0, [Message::TestNotification, Message::SoftRestart]);
    }

    #[test]
    fn status_page_uses_latest_readings() {
        let mut monitor = Monitor::new(Preferences::default());
        let (mut outbox, mut screen) = (Outbox::default(), Screen::default());
        monitor.tick(0, false, &mut Probes(-7.25, 41.0), &mut outbox, &mut screen);

        let mut page: heapless::String<4096> = heapless::String::new();
        monitor.serve_status(&mut page, 0).unwrap();
        assert!(page.contains("<b>-7.25&deg!</b>"));
        assert!(page.contains("41.00&deg"));
    }
}
