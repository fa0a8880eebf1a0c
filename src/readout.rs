//! Protocol-agnostic sensor readout
//!
//! A readout turns the latest momentary value and the persisted history into
//! a flat list of named fields. Front ends (XMPP sensor-data, HTTP, a local
//! display) receive them through a [`ReadoutSink`] in bounded batches, so a
//! long history never has to be held in memory at once.

use core::fmt::Write;

use crate::config::{ChannelConfig, Label};
use crate::momentary::LatestMomentary;
use crate::storage::query::{HistoricalQuery, QUERY_BATCH_SIZE};
use crate::storage::{Bucket, BucketStore, Resolution, StoreError};

/// Maximum number of fields handed to the sink in one call
pub const READOUT_BATCH_SIZE: usize = 50;

pub type FieldName = heapless::String<48>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Quantity { value: f32, decimals: u8, unit: Label },
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Momentary,
    Historical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: FieldName,
    /// Seconds since epoch
    pub timestamp: u32,
    pub value: FieldValue,
    pub kind: FieldKind,
}

/// Which fields a client asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadoutRequest {
    /// Start of the historical range, inclusive
    pub from: u32,
    /// End of the historical range, inclusive
    pub to: u32,
    pub momentary: bool,
    pub historical: bool,
}

impl ReadoutRequest {
    pub const fn momentary() -> Self {
        Self {
            from: 0,
            to: u32::MAX,
            momentary: true,
            historical: false,
        }
    }

    pub const fn all(from: u32, to: u32) -> Self {
        Self {
            from,
            to,
            momentary: true,
            historical: true,
        }
    }
}

/// Receiver of readout fields
pub trait ReadoutSink {
    /// Called with at most [`READOUT_BATCH_SIZE`] fields. `done` is set on
    /// the last call of a readout, which may carry no fields.
    fn report(&mut self, fields: &[Field], done: bool);
}

struct Batcher<'s, K: ReadoutSink> {
    sink: &'s mut K,
    fields: heapless::Vec<Field, READOUT_BATCH_SIZE>,
    reported: usize,
}

impl<'s, K: ReadoutSink> Batcher<'s, K> {
    fn new(sink: &'s mut K) -> Self {
        Self {
            sink,
            fields: heapless::Vec::new(),
            reported: 0,
        }
    }

    fn push(&mut self, field: Field) {
        if self.fields.is_full() {
            self.flush();
        }
        // Cannot fail right after a flush
        let _ = self.fields.push(field);
    }

    fn flush(&mut self) {
        if self.fields.is_empty() {
            return;
        }
        self.sink.report(&self.fields, false);
        self.reported += self.fields.len();
        self.fields.clear();
    }

    fn finish(mut self) -> usize {
        self.sink.report(&self.fields, true);
        self.reported += self.fields.len();
        self.reported
    }
}

pub struct Readout<'a, S: BucketStore> {
    channel: &'a ChannelConfig,
    store: &'a S,
    latest: &'a LatestMomentary,
}

impl<'a, S: BucketStore> Readout<'a, S> {
    pub const fn new(channel: &'a ChannelConfig, store: &'a S, latest: &'a LatestMomentary) -> Self {
        Self {
            channel,
            store,
            latest,
        }
    }

    /// Report the requested fields to `sink`. Returns the number of fields.
    ///
    /// On a store error the sink has seen the batches sent so far but no
    /// `done` call.
    pub async fn execute<K: ReadoutSink>(
        &self,
        request: &ReadoutRequest,
        sink: &mut K,
    ) -> Result<usize, StoreError> {
        let mut batcher = Batcher::new(sink);

        if request.momentary {
            if let Some(value) = self.latest.get() {
                batcher.push(Field {
                    name: crate::truncated(&self.channel.primary_name),
                    timestamp: value.timestamp,
                    value: self.quantity(value.primary, &self.channel.unit),
                    kind: FieldKind::Momentary,
                });
                batcher.push(Field {
                    name: crate::truncated(&self.channel.companion_name),
                    timestamp: value.timestamp,
                    value: FieldValue::Boolean(value.companion),
                    kind: FieldKind::Momentary,
                });
            }
        }

        if request.historical {
            // Let the client show momentary values while history loads
            batcher.flush();

            let query = HistoricalQuery::new(self.store);
            for resolution in Resolution::ALL {
                query
                    .for_each_batch(
                        resolution,
                        request.from,
                        request.to,
                        QUERY_BATCH_SIZE,
                        |buckets| {
                            for bucket in buckets {
                                self.bucket_fields(bucket, &mut batcher);
                            }
                        },
                    )
                    .await?;
            }
        }

        Ok(batcher.finish())
    }

    fn quantity(&self, value: f32, unit: &str) -> FieldValue {
        FieldValue::Quantity {
            value,
            decimals: self.channel.decimals,
            unit: crate::truncated(unit),
        }
    }

    fn bucket_fields<K: ReadoutSink>(&self, bucket: &Bucket, batcher: &mut Batcher<'_, K>) {
        let primary = &self.channel.primary_name;
        let unit = &self.channel.unit;
        let resolution = bucket.resolution.label();

        if let Some(avg) = bucket.avg_primary {
            batcher.push(Field {
                name: field_name(primary, resolution, "Average"),
                timestamp: bucket.timestamp,
                value: self.quantity(avg, unit),
                kind: FieldKind::Historical,
            });
        }
        if let Some(avg) = bucket.avg_companion {
            batcher.push(Field {
                name: field_name(&self.channel.companion_name, resolution, "Average"),
                timestamp: bucket.timestamp,
                value: self.quantity(avg, ""),
                kind: FieldKind::Historical,
            });
        }
        if let Some(min) = bucket.min {
            batcher.push(Field {
                name: field_name(primary, resolution, "Minimum"),
                timestamp: min.at,
                value: self.quantity(min.value, unit),
                kind: FieldKind::Historical,
            });
        }
        if let Some(max) = bucket.max {
            batcher.push(Field {
                name: field_name(primary, resolution, "Maximum"),
                timestamp: max.at,
                value: self.quantity(max.value, unit),
                kind: FieldKind::Historical,
            });
        }
    }
}

/// `"<name>, <resolution>, <statistic>"`, truncated to fit
fn field_name(name: &str, resolution: &str, statistic: &str) -> FieldName {
    let mut out = FieldName::new();
    // Overflow only shortens the name
    let _ = write!(out, "{}, {}, {}", name, resolution, statistic);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::momentary::MomentaryValue;
    use crate::storage::{Extremum, MemoryStore};
    use embassy_futures::block_on;

    extern crate alloc;
    use alloc::vec::Vec;

    const T0: u32 = 1_700_000_040;

    #[derive(Default)]
    struct Collect {
        calls: Vec<(usize, bool)>,
        fields: Vec<Field>,
    }

    impl ReadoutSink for Collect {
        fn report(&mut self, fields: &[Field], done: bool) {
            assert!(fields.len() <= READOUT_BATCH_SIZE);
            self.calls.push((fields.len(), done));
            self.fields.extend_from_slice(fields);
        }
    }

    fn full_minute(ts: u32) -> Bucket {
        let mut bucket = Bucket::empty(Resolution::Minute, ts, 40.0, true);
        bucket.avg_primary = Some(41.5);
        bucket.avg_companion = Some(25.0);
        bucket.min = Some(Extremum::new(30.0, ts - 40));
        bucket.max = Some(Extremum::new(55.0, ts - 20));
        bucket
    }

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_momentary_only() {
        let store = MemoryStore::new();
        let latest = LatestMomentary::new();
        latest.set(MomentaryValue {
            primary: 12.5,
            companion: true,
            timestamp: T0,
        });
        let channel = ChannelConfig::default();
        let readout = Readout::new(&channel, &store, &latest);
        let mut sink = Collect::default();

        let n = block_on(readout.execute(&ReadoutRequest::momentary(), &mut sink)).unwrap();

        assert_eq!(n, 2);
        assert_eq!(sink.calls, [(2usize, true)]);
        assert_eq!(names(&sink.fields), ["Light", "Motion"]);
        assert_eq!(
            sink.fields[0].value,
            FieldValue::Quantity {
                value: 12.5,
                decimals: 2,
                unit: crate::truncated("%"),
            }
        );
        assert_eq!(sink.fields[1].value, FieldValue::Boolean(true));
        assert!(sink.fields.iter().all(|f| f.kind == FieldKind::Momentary));
    }

    #[test]
    fn test_nothing_to_report_still_finishes() {
        let store = MemoryStore::new();
        let latest = LatestMomentary::new();
        let channel = ChannelConfig::default();
        let readout = Readout::new(&channel, &store, &latest);
        let mut sink = Collect::default();

        let n = block_on(readout.execute(&ReadoutRequest::all(0, u32::MAX), &mut sink)).unwrap();
        assert_eq!(n, 0);
        assert_eq!(sink.calls, [(0usize, true)]);
    }

    #[test]
    fn test_bucket_fields() {
        let store = MemoryStore::new();
        let mut sparse = Bucket::empty(Resolution::Hour, T0 + 3600, 0.0, false);
        sparse.avg_primary = Some(10.0);
        block_on(async {
            store.insert(&full_minute(T0)).await.unwrap();
            store.insert(&sparse).await.unwrap();
        });
        let latest = LatestMomentary::new();
        let channel = ChannelConfig::default();
        let readout = Readout::new(&channel, &store, &latest);
        let mut sink = Collect::default();

        let n = block_on(readout.execute(&ReadoutRequest::all(0, u32::MAX), &mut sink)).unwrap();

        assert_eq!(n, 5);
        assert_eq!(
            names(&sink.fields),
            [
                "Light, Minute, Average",
                "Motion, Minute, Average",
                "Light, Minute, Minimum",
                "Light, Minute, Maximum",
                "Light, Hour, Average",
            ]
        );
        assert_eq!(sink.fields[2].timestamp, T0 - 40);
        assert_eq!(sink.fields[3].timestamp, T0 - 20);
        assert_eq!(
            sink.fields[1].value,
            FieldValue::Quantity {
                value: 25.0,
                decimals: 2,
                unit: Label::new(),
            }
        );
        assert!(sink.fields.iter().all(|f| f.kind == FieldKind::Historical));
    }

    #[test]
    fn test_history_is_batched() {
        let store = MemoryStore::new();
        block_on(async {
            for i in 0..30 {
                store.insert(&full_minute(T0 + 60 * i)).await.unwrap();
            }
        });
        let latest = LatestMomentary::new();
        latest.set(MomentaryValue {
            primary: 1.0,
            companion: false,
            timestamp: T0 + 1800,
        });
        let channel = ChannelConfig::default();
        let readout = Readout::new(&channel, &store, &latest);
        let mut sink = Collect::default();

        let n = block_on(readout.execute(&ReadoutRequest::all(0, u32::MAX), &mut sink)).unwrap();

        // 2 momentary fields first, then 30 * 4 historical ones
        assert_eq!(n, 122);
        assert_eq!(
            sink.calls,
            [(2usize, false), (50, false), (50, false), (20, true)]
        );
        assert_eq!(sink.calls.iter().filter(|(_, done)| *done).count(), 1);
    }

    #[test]
    fn test_history_respects_range() {
        let store = MemoryStore::new();
        block_on(async {
            for i in 0..10 {
                store.insert(&full_minute(T0 + 60 * i)).await.unwrap();
            }
        });
        let latest = LatestMomentary::new();
        let channel = ChannelConfig::default();
        let readout = Readout::new(&channel, &store, &latest);
        let mut sink = Collect::default();

        let request = ReadoutRequest {
            from: T0 + 120,
            to: T0 + 240,
            momentary: false,
            historical: true,
        };
        let n = block_on(readout.execute(&request, &mut sink)).unwrap();
        assert_eq!(n, 12);
        assert!(
            sink.fields
                .iter()
                .filter(|f| f.name.ends_with("Average"))
                .all(|f| f.timestamp >= T0 + 120 && f.timestamp <= T0 + 240)
        );
    }
}
