//! Per-channel rollup engine
//!
//! One [`Engine`] owns all mutable state of one monitored channel pair: the
//! sample window, the open minute accumulator, and the queue of finalization
//! work that still has to reach the store. It is driven one tick at a time,
//! either directly through [`Engine::tick`] or by [`driver::run`].
//!
//! ## Tick flow
//!
//! ```text
//! raw reading ──> SampleWindow ──> SpikeFilter ──> rescale ──> momentary value
//!                                                                   │
//!                     ┌─────────────────────────────────────────────┘
//!                     ▼
//!              MinuteAccumulator ──(minute rollover)──> pending work
//!                                                           │
//!          store.insert ──> prune ──> compact hour ──> compact day
//! ```
//!
//! A failed store call leaves the step at the head of the pending queue. It
//! is retried on the next tick, after that tick's own sample is accounted.

pub mod driver;
pub mod events;
pub mod pending;

use log::{info, warn};
use thiserror_no_std::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::filter::{SampleWindow, SpikeFilter};
use crate::momentary::{LatestMomentary, MomentaryValue, PublishThrottle};
use crate::sensors::RawSample;
use crate::storage::accumulator::MinuteAccumulator;
use crate::storage::compactor;
use crate::storage::query::{HistoricalQuery, QueryError};
use crate::storage::retention;
use crate::storage::{BucketStore, Resolution, StoreError};
use crate::time::LocalTime;

pub use events::{EngineEvent, EventChannel, EventPublisher, EventSubscriber};
pub use pending::{Finalization, PendingWork};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(ConfigError),
    #[error("Persistence failed: {0}")]
    Store(StoreError),
    #[error("Historical query timed out")]
    Timeout,
}

impl From<QueryError> for EngineError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::Store(e) => EngineError::Store(e),
            QueryError::Timeout => EngineError::Timeout,
        }
    }
}

/// What a single tick produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The older half of the window was empty; nothing was published
    Skipped,
    Published(MomentaryValue),
}

pub struct Engine<'a, S: BucketStore> {
    config: EngineConfig,
    local: LocalTime,
    window: SampleWindow,
    filter: SpikeFilter,
    minute: MinuteAccumulator,
    /// Local minute-of-hour of the last published tick
    tracked_minute: Option<u8>,
    pending: PendingWork,
    throttle: PublishThrottle,
    store: &'a S,
    latest: &'a LatestMomentary,
    publisher: EventPublisher<'a>,
}

impl<'a, S: BucketStore> Engine<'a, S> {
    pub fn new(
        config: EngineConfig,
        store: &'a S,
        latest: &'a LatestMomentary,
        publisher: EventPublisher<'a>,
    ) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        Ok(Self {
            local: config.local_time(),
            throttle: PublishThrottle::new(config.publish_interval_secs),
            config,
            window: SampleWindow::new(),
            filter: SpikeFilter,
            minute: MinuteAccumulator::new(),
            tracked_minute: None,
            pending: PendingWork::new(),
            store,
            latest,
            publisher,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Samples accumulated into the currently open minute
    pub fn open_samples(&self) -> u32 {
        self.minute.count()
    }

    /// Finalization steps still waiting for the store
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Read-only view on the persisted history
    pub fn history(&self) -> HistoricalQuery<'a, S> {
        HistoricalQuery::new(self.store)
    }

    /// Process one raw sample.
    ///
    /// The sample always reaches the window and, when published, the open
    /// minute. A store failure is returned after that, with the failed step
    /// kept for the next tick.
    pub async fn tick(&mut self, sample: RawSample) -> Result<TickOutcome, EngineError> {
        let outcome = self.observe(sample);
        self.flush_pending().await?;
        Ok(outcome)
    }

    fn observe(&mut self, sample: RawSample) -> TickOutcome {
        self.window.push(sample.primary);
        let filtered = self.filter.apply(&mut self.window);

        if let Some(value) = filtered.removed {
            self.publisher.publish_immediate(EngineEvent::SpikeRemoved {
                value,
                timestamp: sample.timestamp,
            });
        }

        let Some(mean) = filtered.mean else {
            return TickOutcome::Skipped;
        };

        let momentary = MomentaryValue {
            primary: self.config.channel.rescale(mean),
            companion: sample.companion,
            timestamp: sample.timestamp,
        };
        self.latest.set(momentary);
        self.publisher.publish_immediate(EngineEvent::Momentary(momentary));
        if self.throttle.admit(&momentary) {
            self.publisher.publish_immediate(EngineEvent::Publish(momentary));
        }

        self.minute
            .observe(momentary.primary, momentary.companion, momentary.timestamp);

        let minute = self.local.minute_of_hour(momentary.timestamp);
        if let Some(previous) = self.tracked_minute.replace(minute) {
            if previous != minute {
                let bucket = self.minute.close(
                    momentary.timestamp,
                    momentary.primary,
                    momentary.companion,
                );
                info!("Closed {}", bucket);
                self.pending.push(Finalization::Persist(bucket));
            }
        }

        TickOutcome::Published(momentary)
    }

    async fn flush_pending(&mut self) -> Result<(), EngineError> {
        while let Some(step) = self.pending.front() {
            let follow_up = match self.run_step(step).await {
                Ok(follow_up) => follow_up,
                Err(e) => {
                    warn!(
                        "Finalization failed, {} step(s) pending: {}",
                        self.pending.len(),
                        e
                    );
                    return Err(EngineError::Store(e));
                }
            };
            self.pending.complete_front();
            if let Some(next) = follow_up {
                self.pending.push_next(next);
            }
        }
        Ok(())
    }

    async fn run_step(&mut self, step: Finalization) -> Result<Option<Finalization>, StoreError> {
        match step {
            Finalization::Persist(bucket) => {
                self.store.insert(&bucket).await?;
                self.publisher.publish_immediate(EngineEvent::BucketClosed(bucket));
                self.prune(bucket.resolution, bucket.timestamp).await;

                Ok(compactor::closes_coarser(&bucket, self.local)
                    .map(|target| Finalization::Compact {
                        target,
                        closing: bucket,
                    }))
            }
            Finalization::Compact { target, closing } => {
                let Some(finer) = target.finer() else {
                    return Ok(None);
                };
                let range = compactor::source_range(target, closing.timestamp, self.local);
                let sources = self
                    .store
                    .find(finer, range, target.max_sources())
                    .await?;
                let bucket = compactor::compact(target, &closing, &sources);
                info!(
                    "Compacted {} {} bucket(s) into {}",
                    sources.len(),
                    finer.label(),
                    bucket
                );
                Ok(Some(Finalization::Persist(bucket)))
            }
        }
    }

    async fn prune(&self, resolution: Resolution, now: u32) {
        if let Err(e) =
            retention::prune(self.store, &self.config.retention, resolution, now).await
        {
            warn!("Pruning {} buckets failed: {}", resolution.label(), e);
        }
    }
}
