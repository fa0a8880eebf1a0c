use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::error;

use super::{Bucket, BucketStore, Resolution, StoreError, TimeRange};

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// Encoded records of one resolution, keyed by bucket timestamp
type Tier = BTreeMap<u32, Vec<u8>>;

struct Tiers {
    minute: Tier,
    hour: Tier,
    day: Tier,
}

impl Tiers {
    const fn new() -> Self {
        Self {
            minute: BTreeMap::new(),
            hour: BTreeMap::new(),
            day: BTreeMap::new(),
        }
    }

    fn tier(&self, resolution: Resolution) -> &Tier {
        match resolution {
            Resolution::Minute => &self.minute,
            Resolution::Hour => &self.hour,
            Resolution::Day => &self.day,
        }
    }

    fn tier_mut(&mut self, resolution: Resolution) -> &mut Tier {
        match resolution {
            Resolution::Minute => &mut self.minute,
            Resolution::Hour => &mut self.hour,
            Resolution::Day => &mut self.day,
        }
    }
}

/// In-RAM record store
///
/// Buckets are kept postcard-encoded, one ordered map per resolution, the
/// same way they would sit in a file-backed store. Access goes through a
/// critical-section mutex so the store can be shared between the tick task
/// and readout tasks.
pub struct MemoryStore {
    tiers: Mutex<CriticalSectionRawMutex, RefCell<Tiers>>,
}

impl MemoryStore {
    pub const fn new() -> Self {
        Self {
            tiers: Mutex::new(RefCell::new(Tiers::new())),
        }
    }

    /// Number of stored buckets of one resolution
    pub fn len(&self, resolution: Resolution) -> usize {
        self.tiers.lock(|tiers| tiers.borrow().tier(resolution).len())
    }

    pub fn is_empty(&self) -> bool {
        Resolution::ALL.iter().all(|r| self.len(*r) == 0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketStore for MemoryStore {
    async fn insert(&self, bucket: &Bucket) -> Result<(), StoreError> {
        let bytes = bucket.to_bytes().map_err(|e| {
            error!("Failed to encode {}: {:?}", bucket, e);
            StoreError::Encode
        })?;

        self.tiers.lock(|tiers| {
            tiers
                .borrow_mut()
                .tier_mut(bucket.resolution)
                .insert(bucket.timestamp, bytes);
        });
        Ok(())
    }

    async fn find(
        &self,
        resolution: Resolution,
        range: TimeRange,
        limit: usize,
    ) -> Result<Vec<Bucket>, StoreError> {
        if range.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        self.tiers.lock(|tiers| {
            let tiers = tiers.borrow();
            tiers
                .tier(resolution)
                .range(range.start..range.end)
                .take(limit)
                .map(|(ts, bytes)| {
                    Bucket::from_bytes(bytes).map_err(|e| {
                        error!("Corrupt {} record at {}: {:?}", resolution.label(), ts, e);
                        StoreError::Decode
                    })
                })
                .collect()
        })
    }

    async fn delete(&self, resolution: Resolution, timestamp: u32) -> Result<(), StoreError> {
        self.tiers.lock(|tiers| {
            tiers.borrow_mut().tier_mut(resolution).remove(&timestamp);
        });
        Ok(())
    }
}
