//! Webhook notifications (IFTTT Maker style).
//!
//! A notification is a single `POST /trigger/{event}/with/key/{key}` with a
//! small JSON body. Delivery is best effort: failures are reported to the
//! caller once and never retried here.

use heapless::String;
use ufmt::{uWrite, uwrite};

use crate::clock::DateTime;
use crate::error::NotifyError;
use crate::event::NotificationEvent;
use crate::preferences::Credentials;
use crate::rendering::{Fixed, Hms};
use crate::sensors::Channel;

pub const IFTTT_HOST: &str = "maker.ifttt.com";
pub const HTTPS_PORT: u16 = 443;

const BODY_CAPACITY: usize = 192;
const LINE_CAPACITY: usize = 128;

/// Delivers notification events somewhere outside the device.
pub trait Notifier {
    fn send(&mut self, event: &NotificationEvent, time: &DateTime) -> Result<(), NotifyError>;
}

/// A byte stream to a remote host.
pub trait Link {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), NotifyError>;

    /// True if the peer certificate matches `fingerprint`.
    fn verify(&mut self, fingerprint: &str, host: &str) -> bool;

    fn write(&mut self, bytes: &[u8]) -> Result<(), NotifyError>;

    /// Reads one line without its trailing `\n` into `buf` and returns its
    /// length, or `None` once the peer has closed.
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, NotifyError>;

    fn close(&mut self);
}

/// Lets `ufmt` write straight onto a link.
struct LinkWriter<'l, L: Link>(&'l mut L);

impl<L: Link> uWrite for LinkWriter<'_, L> {
    type Error = NotifyError;

    fn write_str(&mut self, s: &str) -> Result<(), NotifyError> {
        self.0.write(s.as_bytes())
    }
}

/// Writes the JSON body for `event`.
pub fn write_body<W: uWrite + ?Sized>(
    w: &mut W,
    event: &NotificationEvent,
    time: &DateTime,
) -> Result<(), W::Error> {
    w.write_str("{\"value1\":\"(")?;
    uwrite!(w, "{}) {}", Hms(time), event.message.text())?;
    for (field, channel) in ["value2", "value3"].into_iter().zip(Channel::ALL) {
        uwrite!(
            w,
            "\\n\",\"{}\":\"{} = {}",
            field,
            channel.label(),
            Fixed(event.payload.get(channel).value, 2)
        )?;
    }
    w.write_str("\"}")
}

pub struct IftttNotifier<'a, L: Link> {
    link: L,
    credentials: Credentials<'a>,
}

impl<'a, L: Link> IftttNotifier<'a, L> {
    pub fn new(link: L, credentials: Credentials<'a>) -> Self {
        Self { link, credentials }
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn post(&mut self, event: &NotificationEvent, time: &DateTime) -> Result<(), NotifyError> {
        let mut body: String<BODY_CAPACITY> = String::new();
        write_body(&mut body, event, time).map_err(|_| NotifyError::BufferTooSmall)?;

        let action = self.credentials.events.for_message(event.message);
        let api_key = self.credentials.api_key;

        self.link.connect(IFTTT_HOST, HTTPS_PORT)?;
        if !self.link.verify(self.credentials.fingerprint, IFTTT_HOST) {
            // Same as the device always did: complain, then send anyway.
            warn!("certificate doesn't match {}", IFTTT_HOST);
        }

        debug!("requesting /trigger/{}/with/key/...", action);
        let mut w = LinkWriter(&mut self.link);
        uwrite!(w, "POST /trigger/{}/with/key/{} HTTP/1.1\r\n", action, api_key)?;
        uwrite!(w, "Host: {}\r\n", IFTTT_HOST)?;
        uwrite!(w, "Content-length: {}\r\n", body.len())?;
        w.write_str("Content-Type: application/json\r\n")?;
        w.write_str("Connection: close\r\n\r\n")?;
        w.write_str(&body)?;

        self.skip_headers()
    }

    /// Drains response lines up to the blank line that ends the headers.
    fn skip_headers(&mut self) -> Result<(), NotifyError> {
        let mut line = [0u8; LINE_CAPACITY];
        while let Some(len) = self.link.read_line(&mut line)? {
            if line[..len] == *b"\r" || len == 0 {
                debug!("headers received");
                break;
            }
        }
        Ok(())
    }
}

impl<L: Link> Notifier for IftttNotifier<'_, L> {
    fn send(&mut self, event: &NotificationEvent, time: &DateTime) -> Result<(), NotifyError> {
        info!(
            "notify {}: {} Sensor1 = {} Sensor2 = {}",
            event.category,
            event.message.text(),
            event.payload.first.value,
            event.payload.second.value
        );
        let result = self.post(event, time);
        self.link.close();
        result
    }
}
