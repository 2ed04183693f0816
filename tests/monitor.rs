//! Whole-loop behaviour: probes, button and screen driven through
//! `Monitor::tick` the way the firmware drives them.

use assert_matches::assert_matches;
use frostwatch::alert::AlertState;
use frostwatch::button::ButtonState;
use frostwatch::clock::DateTime;
use frostwatch::error::{NotifyError, SensorError};
use frostwatch::event::{Category, Message, NotificationEvent};
use frostwatch::monitor::{Control, Monitor, StatusDisplay};
use frostwatch::notify::Notifier;
use frostwatch::preferences::Preferences;
use frostwatch::rendering::Frame;
use frostwatch::sensors::{Channel, Reading, SensorSource};
use frostwatch::timer::Millis;

const TICK: Millis = 100;

struct Probes {
    first: f32,
    second: f32,
    broken: bool,
}

impl Probes {
    fn new(first: f32, second: f32) -> Self {
        Self {
            first,
            second,
            broken: false,
        }
    }
}

impl SensorSource for Probes {
    fn poll(&mut self, channel: Channel, now: Millis) -> Result<Reading, SensorError> {
        if self.broken {
            return Err(SensorError::Bus);
        }
        let value = match channel {
            Channel::Sensor1 => self.first,
            Channel::Sensor2 => self.second,
        };
        Ok(Reading::new(channel, value, now))
    }
}

#[derive(Default)]
struct Outbox {
    sent: Vec<(Millis, NotificationEvent)>,
    now: Millis,
}

impl Outbox {
    fn messages(&self) -> Vec<Message> {
        self.sent.iter().map(|(_, e)| e.message).collect()
    }

    fn times_of(&self, category: Category) -> Vec<Millis> {
        self.sent
            .iter()
            .filter(|(_, e)| e.category == category)
            .map(|(t, _)| *t)
            .collect()
    }
}

impl Notifier for Outbox {
    fn send(&mut self, event: &NotificationEvent, _time: &DateTime) -> Result<(), NotifyError> {
        self.sent.push((self.now, *event));
        Ok(())
    }
}

#[derive(Default)]
struct Screen {
    on: bool,
    wakes: usize,
    last: Option<Frame>,
}

impl StatusDisplay for Screen {
    fn set_wake(&mut self, on: bool) {
        if on && !self.on {
            self.wakes += 1;
        }
        self.on = on;
    }

    fn render(&mut self, frame: &Frame) {
        self.last = Some(frame.clone());
    }
}

struct Rig {
    monitor: Monitor,
    probes: Probes,
    outbox: Outbox,
    screen: Screen,
}

impl Rig {
    fn new(first: f32, second: f32) -> Self {
        Self {
            monitor: Monitor::new(Preferences::default()),
            probes: Probes::new(first, second),
            outbox: Outbox::default(),
            screen: Screen::default(),
        }
    }

    fn tick(&mut self, now: Millis, pressed: bool) -> Control {
        self.outbox.now = now;
        self.monitor.tick(
            now,
            pressed,
            &mut self.probes,
            &mut self.outbox,
            &mut self.screen,
        )
    }

    /// Ticks every `TICK` ms over `from..=to`.
    fn run(&mut self, from: Millis, to: Millis, pressed: bool) {
        let mut now = from;
        while now <= to {
            assert_eq!(self.tick(now, pressed), Control::Continue);
            now += TICK;
        }
    }
}

#[test]
fn no_alert_before_confirmation_then_exactly_one() {
    let mut rig = Rig::new(-3.0, -3.0);

    rig.run(0, 9_900, false);
    assert!(rig.outbox.sent.is_empty());
    assert_matches!(rig.monitor.alert_state(), AlertState::Unconfirmed { since: 0 });

    rig.tick(10_000, false);
    assert_eq!(rig.outbox.messages(), [Message::TemperatureAlert]);
    assert_eq!(rig.outbox.sent[0].1.category, Category::Alert);
}

#[test]
fn repeat_alerts_are_spaced_by_interval() {
    let mut rig = Rig::new(-3.0, 20.0);
    rig.run(0, 60_000, false);

    let alerts = rig.outbox.times_of(Category::Alert);
    assert_eq!(alerts, [10_000, 20_000, 30_000, 40_000, 50_000, 60_000]);
    assert!(alerts.windows(2).all(|w| w[1] - w[0] >= 10_000));
    assert_eq!(
        &rig.outbox.messages()[..2],
        [Message::TemperatureAlert, Message::FollowupAlert]
    );
}

#[test]
fn clear_is_sent_once_per_episode() {
    let mut rig = Rig::new(-3.0, -3.0);
    rig.run(0, 15_000, false);
    assert_eq!(rig.outbox.times_of(Category::Alert), [10_000]);

    rig.probes = Probes::new(33.0, 34.0);
    rig.run(15_100, 40_000, false);

    assert_eq!(rig.outbox.times_of(Category::Clear).len(), 1);
    assert_eq!(rig.outbox.messages().last(), Some(&Message::NormalResumed));
    assert_eq!(rig.monitor.alert_state(), AlertState::Normal);
}

#[test]
fn either_probe_alone_is_out_of_spec() {
    for (first, second) in [(-1.0, 50.0), (50.0, -1.0)] {
        let mut rig = Rig::new(first, second);
        rig.run(0, 10_000, false);
        assert_eq!(rig.outbox.messages(), [Message::TemperatureAlert]);
    }
}

#[test]
fn reading_at_threshold_is_in_spec() {
    let mut rig = Rig::new(0.0, 0.0);
    rig.run(0, 30_000, false);
    assert!(rig.outbox.sent.is_empty());
    assert_eq!(rig.monitor.alert_state(), AlertState::Normal);
}

#[test]
fn failing_probes_keep_last_value() {
    let mut rig = Rig::new(-3.0, 20.0);
    rig.tick(0, false);
    rig.probes.broken = true;
    rig.run(100, 10_000, false);

    assert_eq!(rig.monitor.readings().first.value, -3.0);
    assert_eq!(rig.outbox.messages(), [Message::TemperatureAlert]);
}

#[test]
fn holding_the_button_wakes_once() {
    let mut rig = Rig::new(40.0, 40.0);
    for i in 0..10 {
        rig.tick(1_000 + i * 10, true);
    }

    assert_eq!(rig.screen.wakes, 1);
    assert_eq!(rig.monitor.display_state().turned_on_at, 1_000);
    assert!(rig.outbox.sent.is_empty());
}

#[test]
fn short_hold_sends_only_test_notification() {
    let mut rig = Rig::new(40.0, 40.0);
    rig.tick(0, true);
    assert_eq!(rig.tick(4_001, true), Control::Continue);
    assert_eq!(rig.tick(4_500, true), Control::Continue);

    assert_eq!(rig.outbox.messages(), [Message::TestNotification]);
    assert_eq!(rig.outbox.sent[0].1.category, Category::Info);
    assert!(rig.monitor.button_state().secondary_action_sent());
}

#[test]
fn long_hold_sends_both_and_restarts_once() {
    let mut rig = Rig::new(40.0, 40.0);
    let mut restarts = 0;
    let mut now = 0;
    while now <= 25_000 {
        if rig.tick(now, true) == Control::Restart {
            restarts += 1;
        }
        now += TICK;
    }

    assert_eq!(restarts, 1);
    assert_eq!(
        rig.outbox.messages(),
        [Message::TestNotification, Message::SoftRestart]
    );
    assert_eq!(rig.outbox.times_of(Category::Info), [4_100, 20_100]);
}

#[test]
fn release_rearms_the_test_notification() {
    let mut rig = Rig::new(40.0, 40.0);
    rig.tick(0, true);
    rig.tick(4_001, true);
    rig.tick(4_100, false);
    assert_eq!(rig.monitor.button_state(), ButtonState::Idle);

    rig.tick(5_000, true);
    assert!(!rig.monitor.button_state().secondary_action_sent());
    rig.tick(9_001, true);

    assert_eq!(
        rig.outbox.messages(),
        [Message::TestNotification, Message::TestNotification]
    );
}

#[test]
fn screen_turns_off_after_timeout() {
    let mut rig = Rig::new(40.0, 40.0);
    rig.tick(1_000, true);
    rig.tick(1_010, false);

    let mut now = 1_100;
    while now <= 6_000 {
        rig.tick(now, false);
        assert!(rig.screen.on, "screen off early at {now}");
        now += TICK;
    }
    rig.tick(6_001, false);
    assert!(!rig.screen.on);
    assert!(!rig.monitor.display_state().is_on);
}

#[test]
fn low_probe_is_flagged_on_screen() {
    let mut rig = Rig::new(-3.0, 40.0);
    rig.tick(0, false);

    let frame = rig.screen.last.clone().unwrap();
    assert!(frame.top.contains("LOW!"));
    assert!(frame.bottom.contains("-3.0F"));
}

#[test]
fn screen_shows_bridge_address_between_clock_readings() {
    let mut rig = Rig::new(40.0, 40.0);
    rig.monitor.set_address("10.0.0.7");

    rig.tick(0, false);
    assert_eq!(rig.screen.last.as_ref().unwrap().top, "00:00:00");
    rig.tick(5_000, false);
    assert_eq!(rig.screen.last.as_ref().unwrap().top, "10.0.0.7");
    rig.tick(10_000, false);
    assert_eq!(rig.screen.last.as_ref().unwrap().top, "00:00:10");
}
