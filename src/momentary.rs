//! Momentary (live) values of the monitored channel

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Smoothed primary value and companion signal at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentaryValue {
    /// Published primary value in display units
    pub primary: f32,
    pub companion: bool,
    /// Seconds since epoch
    pub timestamp: u32,
}

/// Last published momentary value, shared between the tick task and readers
pub struct LatestMomentary {
    value: Mutex<CriticalSectionRawMutex, Cell<Option<MomentaryValue>>>,
}

impl LatestMomentary {
    pub const fn new() -> Self {
        Self {
            value: Mutex::new(Cell::new(None)),
        }
    }

    pub fn get(&self) -> Option<MomentaryValue> {
        self.value.lock(|cell| cell.get())
    }

    pub(crate) fn set(&self, value: MomentaryValue) {
        self.value.lock(|cell| cell.set(Some(value)));
    }
}

impl Default for LatestMomentary {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limit for publishing momentary values on a sensor-data channel
///
/// A value is let through when nothing was published yet, when at least
/// `interval_secs` passed since the last publication, or when the companion
/// signal changed since then.
#[derive(Debug, Clone, Copy)]
pub struct PublishThrottle {
    interval_secs: u32,
    last: Option<(u32, bool)>,
}

impl PublishThrottle {
    pub const fn new(interval_secs: u32) -> Self {
        Self {
            interval_secs,
            last: None,
        }
    }

    /// Decide whether `value` is published, and record it if so
    pub fn admit(&mut self, value: &MomentaryValue) -> bool {
        let due = match self.last {
            None => true,
            Some((at, companion)) => {
                companion != value.companion
                    || value.timestamp.saturating_sub(at) >= self.interval_secs
            }
        };
        if due {
            self.last = Some((value.timestamp, value.companion));
        }
        due
    }
}
