use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("Sensor not ready")]
    NotReady,
    #[error("Sensor read failed: {0}")]
    Read(heapless::String<64>),
}

/// One acquisition of the monitored channel pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Primary channel in sensor-native units (e.g. 0-1023 from an ADC)
    pub primary: i32,
    /// Companion boolean signal (e.g. a PIR motion output)
    pub companion: bool,
}

/// Trait for devices producing one [`Reading`] per tick.
pub trait SampleSource {
    /// Read the device. An error skips the current tick.
    fn read(&mut self) -> impl Future<Output = Result<Reading, SensorError>>;
}

/// A reading stamped with the wall-clock time of its tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub primary: i32,
    pub companion: bool,
    /// Seconds since epoch
    pub timestamp: u32,
}

impl RawSample {
    pub const fn new(primary: i32, companion: bool, timestamp: u32) -> Self {
        Self {
            primary,
            companion,
            timestamp,
        }
    }

    pub const fn from_reading(reading: Reading, timestamp: u32) -> Self {
        Self::new(reading.primary, reading.companion, timestamp)
    }
}
