//! Fixtures shared by the unit tests

use core::cell::Cell;

use crate::storage::{Bucket, BucketStore, MemoryStore, Resolution, StoreError, TimeRange};
use crate::time::WallClock;

extern crate alloc;
use alloc::vec::Vec;

/// A store whose operations never complete
pub struct StalledStore;

impl BucketStore for StalledStore {
    async fn insert(&self, _bucket: &Bucket) -> Result<(), StoreError> {
        core::future::pending().await
    }

    async fn find(
        &self,
        _resolution: Resolution,
        _range: TimeRange,
        _limit: usize,
    ) -> Result<Vec<Bucket>, StoreError> {
        core::future::pending().await
    }

    async fn delete(&self, _resolution: Resolution, _timestamp: u32) -> Result<(), StoreError> {
        core::future::pending().await
    }
}

/// A [`MemoryStore`] whose inserts, lookups and deletes can be made to fail
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_inserts: Cell<bool>,
    pub fail_finds: Cell<bool>,
    pub fail_deletes: Cell<bool>,
    pub insert_attempts: Cell<usize>,
}

impl BucketStore for FlakyStore {
    async fn insert(&self, bucket: &Bucket) -> Result<(), StoreError> {
        self.insert_attempts.set(self.insert_attempts.get() + 1);
        if self.fail_inserts.get() {
            return Err(StoreError::Insert(crate::truncated("card removed")));
        }
        self.inner.insert(bucket).await
    }

    async fn find(
        &self,
        resolution: Resolution,
        range: TimeRange,
        limit: usize,
    ) -> Result<Vec<Bucket>, StoreError> {
        if self.fail_finds.get() {
            return Err(StoreError::Find(crate::truncated("bad sector")));
        }
        self.inner.find(resolution, range, limit).await
    }

    async fn delete(&self, resolution: Resolution, timestamp: u32) -> Result<(), StoreError> {
        if self.fail_deletes.get() {
            return Err(StoreError::Delete(crate::truncated("read-only")));
        }
        self.inner.delete(resolution, timestamp).await
    }
}

/// Wall clock that advances by `step` seconds on every read
pub struct ManualClock {
    now: Cell<u32>,
    step: u32,
}

impl ManualClock {
    pub const fn new(now: u32) -> Self {
        Self::stepping(now, 0)
    }

    pub const fn stepping(start: u32, step: u32) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step));
        now
    }
}
