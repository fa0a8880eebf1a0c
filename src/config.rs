//! Engine configuration
//!
//! The configuration is plain serde data so it can be stored next to the
//! buckets (postcard-encoded) and restored on boot.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

extern crate alloc;
use alloc::vec::Vec;

use crate::storage::Resolution;
use crate::time::LocalTime;

/// Short names used in readout field labels
pub type Label = heapless::String<16>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {0}")]
    Invalid(&'static str),
    #[error("Configuration could not be encoded")]
    Encode,
    #[error("Configuration could not be decoded")]
    Decode,
}

/// Semantics of the monitored channel pair
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    /// Name of the primary channel, e.g. "Light"
    pub primary_name: Label,
    /// Name of the companion channel, e.g. "Motion"
    pub companion_name: Label,
    /// Display unit of the primary channel after rescaling
    pub unit: Label,
    /// Raw reading that maps to `display_scale`
    pub full_scale: f32,
    /// Display value of a full-scale reading
    pub display_scale: f32,
    /// Decimals shown for primary channel values
    pub decimals: u8,
}

impl ChannelConfig {
    /// Rescale a raw-domain value to display units
    pub fn rescale(&self, raw: f32) -> f32 {
        self.display_scale * raw / self.full_scale
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            primary_name: label("Light"),
            companion_name: label("Motion"),
            unit: label("%"),
            full_scale: 1023.0,
            display_scale: 100.0,
            decimals: 2,
        }
    }
}

/// Number of buckets kept per resolution
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub minutes: u32,
    pub hours: u32,
    pub days: u32,
}

impl Retention {
    pub const fn count(&self, resolution: Resolution) -> u32 {
        match resolution {
            Resolution::Minute => self.minutes,
            Resolution::Hour => self.hours,
            Resolution::Day => self.days,
        }
    }

    /// Maximum bucket age in seconds for a resolution
    pub const fn horizon_secs(&self, resolution: Resolution) -> u32 {
        self.count(resolution)
            .saturating_mul(resolution.duration_secs())
    }
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            minutes: 100,
            hours: 100,
            days: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub channel: ChannelConfig,
    pub retention: Retention,
    /// Period of the sampling tick
    pub tick_period_ms: u64,
    /// Minimum spacing of sensor-data publications
    pub publish_interval_secs: u32,
    /// Offset of local time from UTC, used for minute/hour/day boundaries
    pub utc_offset_secs: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            retention: Retention::default(),
            tick_period_ms: 1000,
            publish_interval_secs: 5,
            utc_offset_secs: 0,
        }
    }
}

impl EngineConfig {
    pub const fn local_time(&self) -> LocalTime {
        LocalTime::new(self.utc_offset_secs)
    }

    /// Check values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.channel.full_scale > 0.0) {
            return Err(ConfigError::Invalid("channel.full_scale"));
        }
        if !self.channel.display_scale.is_finite() {
            return Err(ConfigError::Invalid("channel.display_scale"));
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::Invalid("tick_period_ms"));
        }
        for resolution in Resolution::ALL {
            if self.retention.count(resolution) == 0 {
                return Err(ConfigError::Invalid("retention"));
            }
        }
        // Offsets beyond +/- 14h do not exist.
        if self.utc_offset_secs.unsigned_abs() > 14 * 3600 {
            return Err(ConfigError::Invalid("utc_offset_secs"));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Decode)?;
        config.validate()?;
        Ok(config)
    }
}

/// Build a label, truncating at capacity
pub fn label(text: &str) -> Label {
    crate::truncated(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retention.horizon_secs(Resolution::Minute), 6000);
        assert_eq!(config.retention.horizon_secs(Resolution::Hour), 360_000);
        assert_eq!(config.retention.horizon_secs(Resolution::Day), 8_640_000);
    }

    #[test]
    fn test_rescale_to_percent() {
        let channel = ChannelConfig::default();
        assert_eq!(channel.rescale(1023.0), 100.0);
        assert_eq!(channel.rescale(0.0), 0.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = EngineConfig::default();
        config.utc_offset_secs = 3600;
        config.channel.primary_name = label("Lux");

        let bytes = config.to_bytes().unwrap();
        assert_eq!(EngineConfig::from_bytes(&bytes).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = EngineConfig::default();
        config.channel.full_scale = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid("channel.full_scale"))
        );

        let mut config = EngineConfig::default();
        config.retention.hours = 0;
        assert_eq!(config.validate(), Err(ConfigError::Invalid("retention")));

        let mut config = EngineConfig::default();
        config.tick_period_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.utc_offset_secs = -15 * 3600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.channel.full_scale = -1.0;
        let bytes = config.to_bytes().unwrap();
        assert!(EngineConfig::from_bytes(&bytes).is_err());
        assert_eq!(EngineConfig::from_bytes(&[0xff]), Err(ConfigError::Decode));
    }

    #[test]
    fn test_long_label_is_truncated() {
        let name = label("An unreasonably long channel name");
        assert_eq!(name.len(), 16);
    }
}
