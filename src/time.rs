//! Wall-clock access and local calendar boundaries
//!
//! Timestamps are `u32` seconds since the Unix epoch. Rollover decisions are
//! made in local time, described by a fixed offset from UTC in seconds.

/// Source of the current wall-clock time
pub trait WallClock {
    /// Seconds since the Unix epoch
    fn now(&self) -> u32;
}

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3600;
const SECS_PER_DAY: i64 = 86400;

/// Calendar arithmetic for one fixed UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalTime {
    utc_offset_secs: i32,
}

impl LocalTime {
    pub const fn new(utc_offset_secs: i32) -> Self {
        Self { utc_offset_secs }
    }

    pub const fn utc() -> Self {
        Self::new(0)
    }

    const fn local(&self, ts: u32) -> i64 {
        ts as i64 + self.utc_offset_secs as i64
    }

    /// Local minute of the hour (0-59)
    pub const fn minute_of_hour(&self, ts: u32) -> u8 {
        (self.local(ts).div_euclid(SECS_PER_MINUTE).rem_euclid(60)) as u8
    }

    /// Local hour of the day (0-23)
    pub const fn hour_of_day(&self, ts: u32) -> u8 {
        (self.local(ts).div_euclid(SECS_PER_HOUR).rem_euclid(24)) as u8
    }

    /// Start of the local hour containing `ts`
    pub const fn hour_start(&self, ts: u32) -> u32 {
        self.floor(ts, SECS_PER_HOUR)
    }

    /// Start of the local day containing `ts`
    pub const fn day_start(&self, ts: u32) -> u32 {
        self.floor(ts, SECS_PER_DAY)
    }

    const fn floor(&self, ts: u32, unit: i64) -> u32 {
        let into_unit = self.local(ts).rem_euclid(unit);
        let floored = ts as i64 - into_unit;
        if floored < 0 { 0 } else { floored as u32 }
    }
}
