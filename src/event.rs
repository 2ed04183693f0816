//! Notifications produced by the engines.
//!
//! The engines only decide *that* something must be said; wording of the
//! outgoing request is left to the notifier.

use crate::sensors::ReadingPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Category {
    Alert,
    Clear,
    Info,
}

/// What happened, independent of how it is worded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// First alert of an episode, once the confirmation delay has passed.
    TemperatureAlert,
    /// Any later alert in the same episode.
    FollowupAlert,
    NormalResumed,
    TestNotification,
    SoftRestart,
}

impl Message {
    pub fn category(self) -> Category {
        match self {
            Message::TemperatureAlert | Message::FollowupAlert => Category::Alert,
            Message::NormalResumed => Category::Clear,
            Message::TestNotification | Message::SoftRestart => Category::Info,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Message::TemperatureAlert => "Temperature alert!",
            Message::FollowupAlert => "Followup temperature alert!",
            Message::NormalResumed => "Normal temperature resumed.",
            Message::TestNotification => "Test Notification.",
            Message::SoftRestart => "Soft Restart Called.",
        }
    }
}

/// A notification on its way to the notifier. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotificationEvent {
    pub category: Category,
    pub message: Message,
    pub payload: ReadingPair,
}

impl NotificationEvent {
    pub fn new(message: Message, payload: ReadingPair) -> NotificationEvent {
        Self {
            category: message.category(),
            message,
            payload,
        }
    }
}
