use crate::event::Message;
use crate::timer::{Millis, SENSOR_DELAY};

/// Preferences defines the thresholds and timings of the monitor.
/// threshold: Probes reading below this (Fahrenheit) are out of spec
/// sensor_poll: How often the probes are read
/// confirm_delay: How long a probe must stay out of spec before the first alert
/// repeat_interval: Minimum spacing between alerts within one episode
/// secondary_action_delay: Button hold time that sends a test notification
/// restart_delay: Button hold time that restarts the device
/// display_timeout: How long the screen stays on after a press
/// utc_offset_minutes / dst_minutes: Local time offset applied to network time
/// page_refresh_secs: Meta refresh period of the status page
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Preferences {
    pub threshold: f32,
    pub sensor_poll: Millis,
    pub confirm_delay: Millis,
    pub repeat_interval: Millis,
    pub secondary_action_delay: Millis,
    pub restart_delay: Millis,
    pub display_timeout: Millis,
    pub utc_offset_minutes: i32,
    pub dst_minutes: i32,
    pub page_refresh_secs: u16,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            threshold: 0.00,            // Freezing alert at 0F
            sensor_poll: SENSOR_DELAY,  // 1s
            confirm_delay: 10_000,      // 10s out of spec before alerting
            repeat_interval: 10_000,    // 10s between alerts
            secondary_action_delay: 4000,
            restart_delay: 20_000,
            display_timeout: 5000,
            utc_offset_minutes: -6 * 60,
            dst_minutes: 60,
            page_refresh_secs: 15,
        }
    }
}

impl Preferences {
    /// Total local offset from UTC in seconds.
    pub fn local_offset_secs(&self) -> i64 {
        (self.utc_offset_minutes as i64 + self.dst_minutes as i64) * 60
    }
}

/// Webhook event names for the notification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventNames<'a> {
    pub alert: &'a str,
    pub repeat: &'a str,
    pub clear: &'a str,
}

impl<'a> EventNames<'a> {
    /// Follow-up alerts go to the alert event unless given their own.
    pub fn new(alert: &'a str, repeat: Option<&'a str>, clear: &'a str) -> Self {
        Self {
            alert,
            repeat: repeat.unwrap_or(alert),
            clear,
        }
    }

    /// Picks the webhook event a message is posted to.
    pub fn for_message(&self, message: Message) -> &'a str {
        match message {
            Message::TemperatureAlert => self.alert,
            Message::FollowupAlert => self.repeat,
            Message::NormalResumed | Message::TestNotification | Message::SoftRestart => self.clear,
        }
    }
}

/// Secrets loaded once at startup and never changed afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    pub api_key: &'a str,
    /// SHA1 fingerprint of the notification host's certificate
    pub fingerprint: &'a str,
    pub events: EventNames<'a>,
}
