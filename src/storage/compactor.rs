//! Compaction of finer buckets into one coarser bucket
//!
//! Hour buckets are built from the minute buckets of the previous local
//! hour, day buckets from the hour buckets of the previous local day.
//! Averages are means of the source bucket averages. A source bucket with
//! few samples weighs as much as one with many.

use super::{Bucket, Extremum, Resolution, TimeRange};
use crate::time::LocalTime;

/// Whether closing `closing` also closes a window of the next resolution
pub fn closes_coarser(closing: &Bucket, local: LocalTime) -> Option<Resolution> {
    match closing.resolution {
        Resolution::Minute if local.minute_of_hour(closing.timestamp) == 0 => {
            Some(Resolution::Hour)
        }
        Resolution::Hour if local.hour_of_day(closing.timestamp) == 0 => Some(Resolution::Day),
        _ => None,
    }
}

/// Range of source buckets for a `target` bucket triggered at `closed_at`
///
/// This is the whole local hour (or day) before the boundary that
/// `closed_at` falls in.
pub fn source_range(target: Resolution, closed_at: u32, local: LocalTime) -> TimeRange {
    let end = match target {
        Resolution::Minute => closed_at,
        Resolution::Hour => local.hour_start(closed_at),
        Resolution::Day => local.day_start(closed_at),
    };
    TimeRange::new(end.saturating_sub(target.duration_secs()), end)
}

#[derive(Default)]
struct Mean {
    sum: f32,
    n: u32,
}

impl Mean {
    fn add(&mut self, value: Option<f32>) {
        if let Some(value) = value {
            self.sum += value;
            self.n += 1;
        }
    }

    fn get(&self) -> Option<f32> {
        if self.n == 0 {
            None
        } else {
            Some(self.sum / self.n as f32)
        }
    }
}

/// Build the `target` bucket from `sources`.
///
/// The new bucket takes its timestamp and last values from `closing`, the
/// finer bucket whose close triggered the compaction.
pub fn compact(target: Resolution, closing: &Bucket, sources: &[Bucket]) -> Bucket {
    let mut bucket = Bucket::empty(
        target,
        closing.timestamp,
        closing.last_primary,
        closing.last_companion,
    );

    let mut avg_primary = Mean::default();
    let mut avg_companion = Mean::default();
    let mut min: Option<Extremum> = None;
    let mut max: Option<Extremum> = None;

    for source in sources {
        avg_primary.add(source.avg_primary);
        avg_companion.add(source.avg_companion);

        if let Some(candidate) = source.min {
            if min.is_none_or(|current| candidate.value < current.value) {
                min = Some(candidate);
            }
        }
        if let Some(candidate) = source.max {
            if max.is_none_or(|current| candidate.value > current.value) {
                max = Some(candidate);
            }
        }
    }

    bucket.avg_primary = avg_primary.get();
    bucket.avg_companion = avg_companion.get();
    bucket.min = min;
    bucket.max = max;
    bucket
}
