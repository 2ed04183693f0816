//! Text for the LCD and the status page.
//!
//! Everything is written with `ufmt` into fixed-capacity `heapless` strings
//! or straight into a [`uWrite`] sink, so nothing here allocates.

use heapless::String;
use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use crate::clock::DateTime;
use crate::sensors::{Reading, ReadingPair};

pub const LCD_WIDTH: usize = 16;

/// A float printed with a fixed number of decimals, rounded half away from
/// zero. `ufmt` has no float support of its own.
pub struct Fixed(pub f32, pub u8);

impl uDisplay for Fixed {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let Fixed(value, decimals) = *self;
        if value.is_nan() {
            return f.write_str("nan");
        }

        let scale = 10i64.pow(decimals as u32);
        let scaled = value * scale as f32;
        let rounded = if scaled >= 0.0 {
            (scaled + 0.5) as i64
        } else {
            (scaled - 0.5) as i64
        };

        if rounded < 0 {
            f.write_str("-")?;
        }
        let magnitude = rounded.unsigned_abs();
        let scale = scale as u64;
        uwrite!(f, "{}", magnitude / scale)?;
        if decimals > 0 {
            f.write_str(".")?;
            let mut frac = magnitude % scale;
            let mut divisor = scale / 10;
            while divisor > 0 {
                uwrite!(f, "{}", frac / divisor)?;
                frac %= divisor;
                divisor /= 10;
            }
        }
        Ok(())
    }
}

/// Pads a number with a zero before it if < 10
/// NOTE: Only supports values < 100
pub struct Padded(pub u8);

impl uDisplay for Padded {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        if self.0 < 10 {
            f.write_str("0")?;
        }
        uwrite!(f, "{}", self.0)
    }
}

/// Wall time as HH:MM:SS
pub struct Hms<'a>(pub &'a DateTime);

impl uDisplay for Hms<'_> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let t = self.0;
        uwrite!(
            f,
            "{}:{}:{}",
            Padded(t.hour),
            Padded(t.minute),
            Padded(t.second)
        )
    }
}

/// Wall time as "Fri Oct 16, 2026 - 12:34:56"
pub struct Stamp<'a>(pub &'a DateTime);

impl uDisplay for Stamp<'_> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let t = self.0;
        uwrite!(
            f,
            "{} {} {}, {} - {}",
            t.weekday_name(),
            t.month_name(),
            Padded(t.day),
            t.year,
            Hms(t)
        )
    }
}

/// The two LCD lines for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub top: String<LCD_WIDTH>,
    pub bottom: String<LCD_WIDTH>,
}

/// Seconds the top line spends on each of the clock and the address.
const ADDRESS_SWAP_SECS: u8 = 5;

/// Lays out a frame: time on the top line (flagged when any probe is low),
/// one reading per half of the bottom line.
///
/// Once the bridge has reported its `address`, the top line alternates
/// between the clock and the address every few seconds so the status page
/// can be found. A low probe keeps the clock and flag on screen.
pub fn render_frame(
    readings: &ReadingPair,
    threshold: f32,
    time: &DateTime,
    address: Option<&str>,
) -> Frame {
    let mut top: String<LCD_WIDTH> = String::new();
    let low = readings.any_out_of_spec(threshold);
    match address {
        Some(address) if !low && (time.second / ADDRESS_SWAP_SECS) % 2 == 1 => {
            for c in address.chars().take(LCD_WIDTH) {
                let _ = top.push(c);
            }
        }
        _ => {
            // HH:MM:SS plus an 8 char flag always fits 16 columns
            let _ = uwrite!(top, "{}", Hms(time));
            if low {
                let _ = top.push_str("    LOW!");
            }
        }
    }

    let mut bottom: String<LCD_WIDTH> = String::new();
    for reading in [&readings.first, &readings.second] {
        let half = render_half(reading);
        let _ = bottom.push_str(&half);
    }

    Frame { top, bottom }
}

/// One reading, left aligned in 8 columns. Values too wide show as dashes.
fn render_half(reading: &Reading) -> String<8> {
    let mut half: String<8> = String::new();
    if uwrite!(half, "{}F", Fixed(reading.value, 1)).is_err() {
        half.clear();
        let _ = half.push_str("----");
    }
    while half.len() < 8 {
        let _ = half.push(' ');
    }
    half
}

const PAGE_HEAD: &str = concat!(
    "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\r\n",
    "  <link rel=\"icon\" href=\"data:,\">\r\n",
    "  <style>\r\n",
    "    html {font-family: Helvetica;}\r\n",
    "    table {border-collapse:collapse;width: 50%}\r\n",
    "    table, td, th {border:1px solid gray;padding:5px;text-align:center;}\r\n",
    "    th {background-color: #666361; color: white;}\r\n",
    "  </style>\r\n",
    "  <script>\r\n",
    "    function localTime() {\r\n",
    "      var el = document.getElementById('LocalTime');\r\n",
    "      if (el) { el.innerHTML = new Date().toString().slice(0, 24); }\r\n",
    "      setTimeout(localTime, 500);\r\n",
    "    }\r\n",
    "  </script>\r\n",
    "</head>\r\n",
);

const TABLE_OPEN: &str = "<table align=\"center\" style=\"width: 100%; max-width: 500px;\">\r\n";

/// Writes the status page body (everything after the response headers).
/// A probe below `threshold` is shown in bold red.
pub fn write_status_page<W: uWrite + ?Sized>(
    w: &mut W,
    readings: &ReadingPair,
    threshold: f32,
    time: &DateTime,
    refresh_secs: u16,
) -> Result<(), W::Error> {
    w.write_str("<!DOCTYPE html><html>\r\n<head>\r\n")?;
    uwrite!(
        w,
        "  <meta http-equiv=\"refresh\" content=\"{}\">\r\n",
        refresh_secs
    )?;
    w.write_str(PAGE_HEAD)?;

    w.write_str("<body>\r\n<br>\r\n")?;
    w.write_str(TABLE_OPEN)?;
    w.write_str("  <tr>\r\n    <th>Remote Timestamp</th>\r\n    <th>Local Time</th>\r\n  </tr>\r\n")?;
    uwrite!(
        w,
        "  <tr>\r\n    <td>{}</td>\r\n    <td id=\"LocalTime\"></td>\r\n  </tr>\r\n",
        Stamp(time)
    )?;
    w.write_str("</table>\r\n<br>\r\n")?;

    w.write_str(TABLE_OPEN)?;
    w.write_str("  <tr>\r\n    <th>Sensor 1 Temp</th>\r\n    <th>Sensor 2 Temp</th>\r\n  </tr>\r\n")?;
    w.write_str("  <tr>\r\n")?;
    for reading in [&readings.first, &readings.second] {
        write_temperature_cell(w, reading, threshold)?;
    }
    w.write_str("  </tr>\r\n</table>\r\n")?;
    w.write_str("<script>localTime();</script>\r\n</body>\r\n</html>\r\n")
}

fn write_temperature_cell<W: uWrite + ?Sized>(
    w: &mut W,
    reading: &Reading,
    threshold: f32,
) -> Result<(), W::Error> {
    let value = Fixed(reading.value, 2);
    if reading.is_out_of_spec(threshold) {
        uwrite!(
            w,
            "    <td><font size=\"5\" color=\"red\"><b>{}&deg!</b></font></td>\r\n",
            value
        )
    } else {
        uwrite!(w, "    <td><font size=\"5\">{}&deg</font></td>\r\n", value)
    }
}
