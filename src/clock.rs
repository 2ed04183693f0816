//! Wall-clock time on top of the monotonic millisecond counter.
//!
//! The clock starts at 00:00:00 Jan 1 2000 and jumps to local time once a
//! network time value arrives through [`WallClock::sync`].

use crate::timer::{elapsed, Millis};

pub const WDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// 2000-01-01 00:00:00 as seconds since the Unix epoch
const Y2K: i64 = 946_684_800;
const SECS_PER_DAY: i64 = 86_400;

/// A broken-down local date and time.
/// month: 1-12, day: 1-31, weekday: 0 = Sunday
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub weekday: u8,
}

impl DateTime {
    /// Breaks down seconds since the Unix epoch. Works for dates before
    /// 1970 too.
    pub fn from_unix(secs: i64) -> DateTime {
        let days = secs.div_euclid(SECS_PER_DAY);
        let rem = secs.rem_euclid(SECS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        DateTime {
            year,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: (rem % 3600 / 60) as u8,
            second: (rem % 60) as u8,
            // 1970-01-01 was a Thursday
            weekday: (days + 4).rem_euclid(7) as u8,
        }
    }

    pub fn weekday_name(&self) -> &'static str {
        WDAY_NAMES[self.weekday as usize % 7]
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize + 11) % 12]
    }
}

/// Days since 1970-01-01 to (year, month, day) in the proleptic Gregorian
/// calendar.
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year as i32, month, day)
}

pub struct WallClock {
    offset_secs: i64,
    base_local: i64,
    base_ms: Millis,
    synced: bool,
}

impl WallClock {
    /// offset_secs: local offset from UTC applied to synced time
    pub fn new(offset_secs: i64) -> WallClock {
        Self {
            offset_secs,
            base_local: Y2K,
            base_ms: 0,
            synced: false,
        }
    }

    /// Anchors the clock: `unix_secs` (UTC) was true at monotonic `now`.
    pub fn sync(&mut self, unix_secs: i64, now: Millis) {
        self.base_local = unix_secs + self.offset_secs;
        self.base_ms = now;
        self.synced = true;
        info!("clock synced to {=i64}", unix_secs);
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Local seconds since the Unix epoch at monotonic `now`.
    pub fn local_secs(&self, now: Millis) -> i64 {
        self.base_local + (elapsed(now, self.base_ms) / 1000) as i64
    }

    pub fn now(&self, now: Millis) -> DateTime {
        DateTime::from_unix(self.local_secs(now))
    }
}
