use embassy_time::{Duration, with_timeout};

use super::{Bucket, BucketStore, Resolution, StoreError, TimeRange};

extern crate alloc;
use alloc::vec::Vec;

/// Default page size used when walking a range
pub const QUERY_BATCH_SIZE: usize = 50;

/// Read-only access to persisted buckets
///
/// Safe to use while the engine is ticking: it only reads finalized,
/// immutable buckets through the store.
pub struct HistoricalQuery<'a, S: BucketStore> {
    store: &'a S,
}

impl<'a, S: BucketStore> HistoricalQuery<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All `resolution` buckets with `from <= timestamp <= to`, ascending.
    ///
    /// An empty range yields an empty vector, not an error.
    pub async fn query(
        &self,
        resolution: Resolution,
        from: u32,
        to: u32,
    ) -> Result<Vec<Bucket>, StoreError> {
        let mut all = Vec::new();
        self.for_each_batch(resolution, from, to, QUERY_BATCH_SIZE, |batch| {
            all.extend_from_slice(batch)
        })
        .await?;
        Ok(all)
    }

    /// Walk `from..=to` in pages of at most `batch_size` buckets.
    ///
    /// `f` is called once per non-empty page, in ascending timestamp order.
    /// Returns the total number of buckets visited.
    pub async fn for_each_batch<F>(
        &self,
        resolution: Resolution,
        from: u32,
        to: u32,
        batch_size: usize,
        mut f: F,
    ) -> Result<usize, StoreError>
    where
        F: FnMut(&[Bucket]),
    {
        let batch_size = batch_size.max(1);
        let mut range = TimeRange::inclusive(from, to);
        let mut visited = 0;

        while !range.is_empty() {
            let batch = self.store.find(resolution, range, batch_size).await?;
            let Some(last) = batch.last() else {
                break;
            };
            range.start = last.timestamp.saturating_add(1);
            visited += batch.len();
            f(&batch);

            if batch.len() < batch_size || last.timestamp == u32::MAX {
                break;
            }
        }
        Ok(visited)
    }

    /// [`HistoricalQuery::query`] bounded by a caller-side timeout
    pub async fn query_with_timeout(
        &self,
        resolution: Resolution,
        from: u32,
        to: u32,
        timeout: Duration,
    ) -> Result<Vec<Bucket>, QueryError> {
        match with_timeout(timeout, self.query(resolution, from, to)).await {
            Ok(result) => result.map_err(QueryError::Store),
            Err(_) => Err(QueryError::Timeout),
        }
    }
}

#[derive(thiserror_no_std::Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Store error: {0}")]
    Store(StoreError),
    #[error("Historical query timed out")]
    Timeout,
}
