//! Raspberry Pi Pico wiring: two BME680 probes, an HD44780 16x2 LCD with a
//! switched backlight, and a serial network bridge on UART0.
//!
//! The Pico has no radio of its own. A bridge MCU on UART0 owns the network
//! and speaks a line protocol:
//!
//! ```text
//! pico -> bridge                 bridge -> pico
//! JOIN <ssid> <password>         OK | ERR
//! OPEN <host> <port>             OK | ERR
//! VERIFY <fingerprint> <host>    OK | ERR
//! SEND <len>\n<len bytes>        (nothing)
//! CLOSE                          (nothing)
//! REPLY / END                    (frames a status page response)
//!                                RX <line>     response line from the host
//!                                EOF           host closed the connection
//!                                TIME <secs>   network time (UTC)
//!                                IP <addr>     bridge address on the LAN
//!                                HTTP <line>   status page request line
//! ```

use bme680::{Bme680, FieldDataCondition, PowerMode};
use embedded_hal::digital::OutputPin;
use hd44780_driver::bus::FourBitBus;
use hd44780_driver::{Cursor, CursorBlink, Display, DisplayMode, HD44780};
use heapless::Vec;
use rp_pico::hal::gpio::bank0::{
    Gpio0, Gpio1, Gpio13, Gpio14, Gpio15, Gpio16, Gpio17, Gpio2, Gpio3, Gpio4, Gpio5, Gpio8,
    Gpio9,
};
use rp_pico::hal::gpio::{FunctionI2C, FunctionSio, FunctionUart, Pin, PullDown, PullUp, SioOutput};
use rp_pico::hal::uart::{Enabled, UartPeripheral};
use rp_pico::hal::{Timer, I2C};
use rp_pico::pac;
use ufmt::{uWrite, uwrite};

use crate::error::{DisplayError, NotifyError, SensorError};
use crate::bridge::{BridgeEvent, Inbox};
use crate::monitor::StatusDisplay;
use crate::notify::Link;
use crate::rendering::Frame;
use crate::sensors::{celsius_to_fahrenheit, Channel, Reading, SensorSource};
use crate::timer::Millis;

type Output<P> = Pin<P, FunctionSio<SioOutput>, PullDown>;

pub type ProbeBus1 = I2C<pac::I2C0, (Pin<Gpio8, FunctionI2C, PullUp>, Pin<Gpio9, FunctionI2C, PullUp>)>;
pub type ProbeBus2 =
    I2C<pac::I2C1, (Pin<Gpio14, FunctionI2C, PullUp>, Pin<Gpio15, FunctionI2C, PullUp>)>;

pub type Lcd = HD44780<
    FourBitBus<Output<Gpio0>, Output<Gpio1>, Output<Gpio2>, Output<Gpio3>, Output<Gpio4>, Output<Gpio5>>,
>;

pub type BridgeUart = UartPeripheral<
    Enabled,
    pac::UART0,
    (Pin<Gpio16, FunctionUart, PullDown>, Pin<Gpio17, FunctionUart, PullDown>),
>;

/// How long to wait on the bridge for a reply line
const BRIDGE_TIMEOUT_MS: Millis = 5000;
const BRIDGE_LINE: usize = 160;
/// HD44780 DDRAM address of the second row
const LCD_ROW_2: u8 = 0x40;

/// Milliseconds since boot from the RP2040 timer.
pub fn millis(timer: &Timer) -> Millis {
    timer.get_counter().ticks() / 1000
}

/// Both temperature probes, one per I2C bus.
pub struct Probes {
    first: Bme680<ProbeBus1, Timer>,
    second: Bme680<ProbeBus2, Timer>,
    delay: Timer,
}

impl Probes {
    pub fn new(first: Bme680<ProbeBus1, Timer>, second: Bme680<ProbeBus2, Timer>, delay: Timer) -> Self {
        Self {
            first,
            second,
            delay,
        }
    }
}

impl SensorSource for Probes {
    /// Runs one forced-mode measurement and converts it to Fahrenheit
    fn poll(&mut self, channel: Channel, now: Millis) -> Result<Reading, SensorError> {
        let delay = &mut self.delay;
        let (data, condition) = match channel {
            Channel::Sensor1 => {
                self.first
                    .set_sensor_mode(delay, PowerMode::ForcedMode)
                    .map_err(|_| SensorError::Bus)?;
                self.first.get_sensor_data(delay).map_err(|_| SensorError::Bus)?
            }
            Channel::Sensor2 => {
                self.second
                    .set_sensor_mode(delay, PowerMode::ForcedMode)
                    .map_err(|_| SensorError::Bus)?;
                self.second.get_sensor_data(delay).map_err(|_| SensorError::Bus)?
            }
        };

        if matches!(condition, FieldDataCondition::Unchanged) {
            return Err(SensorError::NotReady);
        }
        Ok(Reading::new(
            channel,
            celsius_to_fahrenheit(data.temperature_celsius()),
            now,
        ))
    }
}

/// The LCD plus its backlight switch. Only redraws when the frame changes.
pub struct Screen {
    lcd: Lcd,
    backlight: Output<Gpio13>,
    delay: Timer,
    on: Option<bool>,
    last: Option<Frame>,
}

impl Screen {
    pub fn new(lcd: Lcd, backlight: Output<Gpio13>, delay: Timer) -> Self {
        Self {
            lcd,
            backlight,
            delay,
            on: None,
            last: None,
        }
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let delay = &mut self.delay;
        self.lcd.clear(delay).map_err(|_| DisplayError::Bus)?;
        self.lcd.write_str(&frame.top, delay).map_err(|_| DisplayError::Bus)?;
        self.lcd
            .set_cursor_pos(LCD_ROW_2, delay)
            .map_err(|_| DisplayError::Bus)?;
        self.lcd
            .write_str(&frame.bottom, delay)
            .map_err(|_| DisplayError::Bus)
    }
}

impl StatusDisplay for Screen {
    fn set_wake(&mut self, on: bool) {
        if self.on == Some(on) {
            return;
        }
        let mode = DisplayMode {
            display: if on { Display::On } else { Display::Off },
            cursor_visibility: Cursor::Invisible,
            cursor_blink: CursorBlink::Off,
        };
        if let Err(e) = self
            .lcd
            .set_display_mode(mode, &mut self.delay)
            .map_err(|_| DisplayError::Bus)
        {
            warn!("lcd mode change failed: {}", e);
            return;
        }
        // Pin writes on the RP2040 are infallible
        let Ok(()) = if on {
            self.backlight.set_high()
        } else {
            self.backlight.set_low()
        };
        info!("display {}", if on { "on" } else { "off" });
        self.on = Some(on);
    }

    fn render(&mut self, frame: &Frame) {
        if self.last.as_ref() == Some(frame) {
            return;
        }
        match self.draw(frame) {
            Ok(()) => self.last = Some(frame.clone()),
            Err(e) => warn!("lcd write failed: {}", e),
        }
    }
}

/// The UART link to the network bridge.
pub struct Bridge {
    uart: BridgeUart,
    timer: Timer,
    pending: Vec<u8, BRIDGE_LINE>,
    inbox: Inbox,
}

impl Bridge {
    pub fn new(uart: BridgeUart, timer: Timer) -> Self {
        Self {
            uart,
            timer,
            pending: Vec::new(),
            inbox: Inbox::new(),
        }
    }

    /// Hands the network credentials to the bridge. Returns true once the
    /// bridge reports it joined.
    pub fn join(&mut self, ssid: &str, password: &str) -> bool {
        let _ = uwrite!(Command(&mut self.uart), "JOIN {} {}\n", ssid, password);
        self.expect_ok()
    }

    /// Starts a status page reply; everything written via [`uWrite`] until
    /// [`Bridge::end_reply`] goes to the requesting client.
    pub fn begin_reply(&mut self) {
        self.uart.write_full_blocking(b"REPLY\n");
    }

    pub fn end_reply(&mut self) {
        self.uart.write_full_blocking(b"END\n");
        self.inbox.finish_request();
    }

    /// Non-blocking: drains whatever the bridge has sent and returns the
    /// oldest pending notice.
    pub fn poll(&mut self) -> Option<BridgeEvent> {
        while let Some(line) = self.take_line() {
            if let Some(reply) = self.inbox.accept(&line) {
                debug!("stray bridge reply ({=usize} bytes)", reply.len());
            }
        }
        self.inbox.next_event()
    }

    /// Reads whatever is buffered in the UART and returns a line once its
    /// `\n` has arrived. Partial lines stay in `pending`.
    fn take_line(&mut self) -> Option<Vec<u8, BRIDGE_LINE>> {
        let mut byte = [0u8; 1];
        while self.uart.uart_is_readable() {
            if !matches!(self.uart.read_raw(&mut byte), Ok(1)) {
                break;
            }
            if byte[0] == b'\n' {
                return Some(core::mem::take(&mut self.pending));
            }
            // Overlong lines are truncated
            let _ = self.pending.push(byte[0]);
        }
        None
    }

    /// Blocks until a reply line arrives or the timeout passes. Notices
    /// that arrive meanwhile are queued for [`Bridge::poll`].
    fn read_reply(&mut self, buf: &mut [u8]) -> Option<usize> {
        let deadline = millis(&self.timer) + BRIDGE_TIMEOUT_MS;
        while millis(&self.timer) < deadline {
            let Some(line) = self.take_line() else {
                continue;
            };
            if let Some(reply) = self.inbox.accept(&line) {
                let len = reply.len().min(buf.len());
                buf[..len].copy_from_slice(&reply[..len]);
                return Some(len);
            }
        }
        warn!("bridge timed out");
        None
    }

    fn expect_ok(&mut self) -> bool {
        let mut buf = [0u8; 8];
        matches!(self.read_reply(&mut buf), Some(len) if buf[..len] == *b"OK")
    }
}

/// Writes bridge commands straight to the UART.
struct Command<'u>(&'u mut BridgeUart);

impl uWrite for Command<'_> {
    type Error = NotifyError;

    fn write_str(&mut self, s: &str) -> Result<(), NotifyError> {
        self.0.write_full_blocking(s.as_bytes());
        Ok(())
    }
}

impl Link for Bridge {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), NotifyError> {
        uwrite!(Command(&mut self.uart), "OPEN {} {}\n", host, port)?;
        if self.expect_ok() {
            Ok(())
        } else {
            Err(NotifyError::Connect)
        }
    }

    fn verify(&mut self, fingerprint: &str, host: &str) -> bool {
        if uwrite!(Command(&mut self.uart), "VERIFY {} {}\n", fingerprint, host).is_err() {
            return false;
        }
        self.expect_ok()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), NotifyError> {
        uwrite!(Command(&mut self.uart), "SEND {}\n", bytes.len())?;
        self.uart.write_full_blocking(bytes);
        Ok(())
    }

    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, NotifyError> {
        let mut frame = [0u8; BRIDGE_LINE];
        let Some(len) = self.read_reply(&mut frame) else {
            return Err(NotifyError::Connect);
        };
        let frame = &frame[..len];
        if frame == b"EOF" {
            return Ok(None);
        }
        let line = frame.strip_prefix(b"RX ").unwrap_or(frame);
        let n = line.len().min(buf.len());
        buf[..n].copy_from_slice(&line[..n]);
        Ok(Some(n))
    }

    fn close(&mut self) {
        self.uart.write_full_blocking(b"CLOSE\n");
    }
}

impl uWrite for Bridge {
    type Error = NotifyError;

    fn write_str(&mut self, s: &str) -> Result<(), NotifyError> {
        self.write(s.as_bytes())
    }
}

/// Resets the chip. Never returns.
pub fn restart() -> ! {
    cortex_m::peripheral::SCB::sys_reset()
}
