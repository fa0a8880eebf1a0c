use super::{Bucket, Extremum, Resolution};

/// Running aggregate for the currently open minute
///
/// Fed once per published tick with the smoothed primary value and the
/// companion signal. [`MinuteAccumulator::close`] turns the aggregate into
/// an immutable minute bucket and starts over.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinuteAccumulator {
    sum_primary: f32,
    count: u32,
    /// Number of observations with the companion signal set
    companion_true: u32,
    min: Option<Extremum>,
    max: Option<Extremum>,
}

impl MinuteAccumulator {
    pub const fn new() -> Self {
        Self {
            sum_primary: 0.0,
            count: 0,
            companion_true: 0,
            min: None,
            max: None,
        }
    }

    /// Number of observations in the open minute
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Add one published observation.
    ///
    /// The first observation seeds both bounds. Later observations only
    /// replace a bound when strictly beyond it, so ties keep the earliest
    /// instant.
    pub fn observe(&mut self, primary: f32, companion: bool, timestamp: u32) {
        self.sum_primary += primary;
        self.count += 1;
        if companion {
            self.companion_true += 1;
        }

        match self.min {
            Some(min) if primary >= min.value => {}
            _ => self.min = Some(Extremum::new(primary, timestamp)),
        }
        match self.max {
            Some(max) if primary <= max.value => {}
            _ => self.max = Some(Extremum::new(primary, timestamp)),
        }
    }

    /// Finalize the open minute into a bucket closed at `timestamp` and reset.
    pub fn close(&mut self, timestamp: u32, last_primary: f32, last_companion: bool) -> Bucket {
        let mut bucket = Bucket::empty(Resolution::Minute, timestamp, last_primary, last_companion);
        if self.count > 0 {
            let n = self.count as f32;
            bucket.avg_primary = Some(self.sum_primary / n);
            bucket.avg_companion = Some(100.0 * self.companion_true as f32 / n);
            bucket.min = self.min;
            bucket.max = self.max;
        }
        *self = Self::new();
        bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_seeds_bounds() {
        let mut acc = MinuteAccumulator::new();
        acc.observe(42.0, false, 1000);
        let bucket = acc.close(1060, 42.0, false);

        assert_eq!(bucket.min, Some(Extremum::new(42.0, 1000)));
        assert_eq!(bucket.max, Some(Extremum::new(42.0, 1000)));
        assert_eq!(bucket.avg_primary, Some(42.0));
        assert_eq!(bucket.avg_companion, Some(0.0));
    }

    #[test]
    fn test_extrema_keep_first_instant_on_ties() {
        let mut acc = MinuteAccumulator::new();
        acc.observe(10.0, true, 1);
        acc.observe(30.0, true, 2);
        acc.observe(5.0, false, 3);
        acc.observe(30.0, false, 4);
        acc.observe(5.0, false, 5);
        let bucket = acc.close(60, 5.0, false);

        assert_eq!(bucket.min, Some(Extremum::new(5.0, 3)));
        assert_eq!(bucket.max, Some(Extremum::new(30.0, 2)));
        assert_eq!(bucket.avg_primary, Some(16.0));
        assert_eq!(bucket.avg_companion, Some(40.0));
    }

    #[test]
    fn test_empty_minute_has_absent_aggregates() {
        let mut acc = MinuteAccumulator::new();
        let bucket = acc.close(120, 1.5, true);

        assert_eq!(bucket.resolution, Resolution::Minute);
        assert_eq!(bucket.timestamp, 120);
        assert_eq!(bucket.last_primary, 1.5);
        assert!(bucket.last_companion);
        assert!(bucket.avg_primary.is_none());
        assert!(bucket.avg_companion.is_none());
        assert!(bucket.min.is_none() && bucket.max.is_none());
    }

    #[test]
    fn test_close_resets() {
        let mut acc = MinuteAccumulator::new();
        acc.observe(1.0, true, 1);
        acc.close(60, 1.0, true);
        assert_eq!(acc.count(), 0);

        acc.observe(3.0, false, 61);
        let bucket = acc.close(120, 3.0, false);
        assert_eq!(bucket.avg_primary, Some(3.0));
        assert_eq!(bucket.min, Some(Extremum::new(3.0, 61)));
    }
}
