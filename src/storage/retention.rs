use log::debug;

use super::{BucketStore, Resolution, StoreError, TimeRange};
use crate::config::Retention;

/// Delete every `resolution` bucket older than the retention horizon.
///
/// A bucket is kept while `timestamp >= now - horizon`. Returns the number
/// of deleted buckets. Running it again with the same `now` deletes nothing.
pub async fn prune<S: BucketStore>(
    store: &S,
    retention: &Retention,
    resolution: Resolution,
    now: u32,
) -> Result<usize, StoreError> {
    let cutoff = now.saturating_sub(retention.horizon_secs(resolution));
    let expired = store
        .find(resolution, TimeRange::before(cutoff), usize::MAX)
        .await?;

    for bucket in &expired {
        store.delete(resolution, bucket.timestamp).await?;
    }

    if !expired.is_empty() {
        debug!(
            "Pruned {} {} bucket(s) older than {}",
            expired.len(),
            resolution.label(),
            cutoff
        );
    }
    Ok(expired.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Bucket, MemoryStore};
    use embassy_futures::block_on;

    extern crate alloc;
    use alloc::vec::Vec;

    const T0: u32 = 1_700_000_000;

    #[test]
    fn test_retention_keeps_exactly_the_horizon() {
        let store = MemoryStore::new();
        let retention = Retention::default();
        let horizon = retention.horizon_secs(Resolution::Minute);

        block_on(async {
            // 102 finalizations, one per minute, pruning after each.
            let mut now = T0;
            for i in 0..102 {
                now = T0 + i * 60;
                store
                    .insert(&Bucket::empty(Resolution::Minute, now, 0.0, false))
                    .await
                    .unwrap();
                prune(&store, &retention, Resolution::Minute, now).await.unwrap();
            }

            let all = store
                .find(Resolution::Minute, TimeRange::new(0, u32::MAX), usize::MAX)
                .await
                .unwrap();
            let stamps: Vec<u32> = all.iter().map(|b| b.timestamp).collect();

            assert!(stamps.iter().all(|ts| *ts >= now - horizon));
            assert_eq!(stamps.len(), 101);
            assert_eq!(stamps[0], T0 + 60);
        });
    }

    #[test]
    fn test_prune_is_idempotent() {
        let store = MemoryStore::new();
        let retention = Retention::default();
        block_on(async {
            for h in 0..5 {
                store
                    .insert(&Bucket::empty(Resolution::Hour, T0 + h * 3600, 0.0, false))
                    .await
                    .unwrap();
            }
            let now = T0 + 104 * 3600;
            assert_eq!(prune(&store, &retention, Resolution::Hour, now).await, Ok(4));
            assert_eq!(prune(&store, &retention, Resolution::Hour, now).await, Ok(0));
            assert_eq!(store.len(Resolution::Hour), 1);
        });
    }

    #[test]
    fn test_prune_only_touches_its_resolution() {
        let store = MemoryStore::new();
        let retention = Retention::default();
        block_on(async {
            store
                .insert(&Bucket::empty(Resolution::Minute, T0, 0.0, false))
                .await
                .unwrap();
            store
                .insert(&Bucket::empty(Resolution::Day, T0, 0.0, false))
                .await
                .unwrap();
            prune(&store, &retention, Resolution::Minute, T0 + 86_400)
                .await
                .unwrap();
            assert_eq!(store.len(Resolution::Minute), 0);
            assert_eq!(store.len(Resolution::Day), 1);
        });
    }

    #[test]
    fn test_prune_early_in_epoch_keeps_everything() {
        let store = MemoryStore::new();
        let retention = Retention::default();
        block_on(async {
            store
                .insert(&Bucket::empty(Resolution::Minute, 10, 0.0, false))
                .await
                .unwrap();
            assert_eq!(
                prune(&store, &retention, Resolution::Minute, 100).await,
                Ok(0)
            );
        });
    }
}
