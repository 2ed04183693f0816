//! Lines coming back from the network bridge.
//!
//! The bridge interleaves two kinds of lines on one serial port: replies to
//! the command the device is waiting on (`OK`, `ERR`, `RX ...`, `EOF`) and
//! unsolicited notices (`TIME`, `IP`, `HTTP`). [`Inbox`] separates them so a
//! notice that arrives mid-command is queued instead of being taken as the
//! reply.

use heapless::{Deque, String};

use crate::http::RequestReader;

pub const ADDRESS_CAPACITY: usize = 16;
const QUEUED_EVENTS: usize = 4;

/// Something the bridge told us between commands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeEvent {
    /// Network time, seconds since the Unix epoch (UTC).
    Time(i64),
    /// The bridge's address on the local network.
    Address(String<ADDRESS_CAPACITY>),
    /// A status page request has been fully received.
    Request,
}

/// Sorts incoming bridge lines into command replies and queued events.
pub struct Inbox {
    request: RequestReader,
    events: Deque<BridgeEvent, QUEUED_EVENTS>,
}

impl Inbox {
    pub const fn new() -> Inbox {
        Self {
            request: RequestReader::new(),
            events: Deque::new(),
        }
    }

    /// Takes one line without its `\n`. Returns it back if it is a reply to
    /// a command, otherwise handles it as a notice and returns `None`.
    pub fn accept<'l>(&mut self, line: &'l [u8]) -> Option<&'l [u8]> {
        if let Some(secs) = line.strip_prefix(b"TIME ") {
            match core::str::from_utf8(secs).ok().and_then(|s| s.trim().parse().ok()) {
                Some(secs) => self.queue(BridgeEvent::Time(secs)),
                None => warn!("bad time from bridge"),
            }
            None
        } else if let Some(address) = line.strip_prefix(b"IP ") {
            let mut text = String::new();
            for &byte in address.iter().filter(|b| b.is_ascii_graphic()) {
                if text.push(byte as char).is_err() {
                    break;
                }
            }
            info!("bridge address {}", text.as_str());
            self.queue(BridgeEvent::Address(text));
            None
        } else if let Some(text) = line.strip_prefix(b"HTTP ") {
            if !self.request.is_complete() {
                self.request.feed(text);
                if self.request.feed(b"\n") {
                    info!("status request: {}", self.request.request_line());
                    self.queue(BridgeEvent::Request);
                }
            }
            None
        } else if line == b"HTTP" {
            // Blank header line with the trailing space stripped
            if !self.request.is_complete() && self.request.feed(b"\n") {
                self.queue(BridgeEvent::Request);
            }
            None
        } else {
            Some(line)
        }
    }

    pub fn next_event(&mut self) -> Option<BridgeEvent> {
        self.events.pop_front()
    }

    /// Call once the response for the current request has been sent.
    pub fn finish_request(&mut self) {
        self.request.reset();
    }

    fn queue(&mut self, event: BridgeEvent) {
        if let Err(event) = self.events.push_back(event) {
            warn!("bridge event dropped: {}", event);
        }
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}
