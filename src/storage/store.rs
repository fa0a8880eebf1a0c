use super::{Bucket, Resolution};
use thiserror_no_std::Error;

extern crate alloc;
use alloc::vec::Vec;

/// Half-open range of bucket timestamps, `start <= ts < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Range covering `from..=to`
    pub const fn inclusive(from: u32, to: u32) -> Self {
        Self {
            start: from,
            end: to.saturating_add(1),
        }
    }

    /// Everything strictly older than `cutoff`
    pub const fn before(cutoff: u32) -> Self {
        Self {
            start: 0,
            end: cutoff,
        }
    }

    pub const fn contains(&self, ts: u32) -> bool {
        ts >= self.start && ts < self.end
    }

    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Bucket insert failed: {0}")]
    Insert(heapless::String<64>),
    #[error("Bucket lookup failed: {0}")]
    Find(heapless::String<64>),
    #[error("Bucket delete failed: {0}")]
    Delete(heapless::String<64>),
    #[error("Bucket encoding failed")]
    Encode,
    #[error("Stored bucket could not be decoded")]
    Decode,
}

/// Persistent ordered record store for buckets
///
/// Implementations must be usable through a shared reference: the tick
/// path inserts and deletes while historical queries read concurrently.
pub trait BucketStore {
    /// Persist a finalized bucket. A bucket with the same resolution and
    /// timestamp is replaced.
    fn insert(&self, bucket: &Bucket) -> impl Future<Output = Result<(), StoreError>>;

    /// Return up to `limit` buckets of `resolution` inside `range`, ordered
    /// by ascending timestamp.
    fn find(
        &self,
        resolution: Resolution,
        range: TimeRange,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Bucket>, StoreError>>;

    /// Remove a bucket. Removing a bucket that does not exist is not an error.
    fn delete(
        &self,
        resolution: Resolution,
        timestamp: u32,
    ) -> impl Future<Output = Result<(), StoreError>>;
}
