use super::Resolution;
use core::fmt::Display;
use serde::{Deserialize, Serialize};

extern crate alloc;
use alloc::vec::Vec;

/// An extreme value of the primary channel and the instant it was observed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    /// Primary channel value in display units
    pub value: f32,
    /// Seconds since epoch
    pub at: u32,
}

impl Extremum {
    pub const fn new(value: f32, at: u32) -> Self {
        Self { value, at }
    }
}

/// Immutable summary record for one minute, hour or day
///
/// A bucket is created when its time window closes and is never modified
/// afterwards. Only the retention pruner removes it from the store.
///
/// The averages are `None` exactly when nothing contributed to the bucket:
/// no smoothed samples for a minute bucket, no finer buckets carrying that
/// average for hour and day buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub resolution: Resolution,
    /// Instant the bucket closed (seconds since epoch)
    pub timestamp: u32,
    /// Published primary value at close time
    pub last_primary: f32,
    /// Companion signal at close time
    pub last_companion: bool,
    pub min: Option<Extremum>,
    pub max: Option<Extremum>,
    /// Average primary value over the window
    pub avg_primary: Option<f32>,
    /// Share of companion `true` observations, as a percentage (0-100)
    pub avg_companion: Option<f32>,
}

impl Bucket {
    /// Create a bucket with no contributing data yet
    pub const fn empty(
        resolution: Resolution,
        timestamp: u32,
        last_primary: f32,
        last_companion: bool,
    ) -> Self {
        Self {
            resolution,
            timestamp,
            last_primary,
            last_companion,
            min: None,
            max: None,
            avg_primary: None,
            avg_companion: None,
        }
    }

    /// Encode the bucket for a record store
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Decode a bucket previously produced by [`Bucket::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{} bucket] ts: {}", self.resolution.label(), self.timestamp)?;
        match self.avg_primary {
            Some(avg) => write!(f, ", avg: {:.2}", avg)?,
            None => write!(f, ", avg: -")?,
        }
        match self.avg_companion {
            Some(avg) => write!(f, ", companion: {:.1}%", avg)?,
            None => write!(f, ", companion: -")?,
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            write!(f, ", min: {:.2}@{}, max: {:.2}@{}", min.value, min.at, max.value, max.at)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_encoding_preserves_absent_fields() {
        let mut bucket = Bucket::empty(Resolution::Hour, 3600, 42.5, true);
        bucket.max = Some(Extremum::new(80.0, 3500));

        let bytes = bucket.to_bytes().unwrap();
        let decoded = Bucket::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, bucket);
        assert!(decoded.avg_primary.is_none());
        assert!(decoded.min.is_none());
    }

    #[test]
    fn test_bucket_from_truncated_bytes_fails() {
        let bucket = Bucket::empty(Resolution::Minute, 60, 1.0, false);
        let bytes = bucket.to_bytes().unwrap();
        assert!(Bucket::from_bytes(&bytes[..2]).is_err());
    }
}
