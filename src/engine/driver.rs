//! Single-flight tick loop
//!
//! Each tick reads the sensor, stamps the reading with the wall clock and
//! runs it through the engine. The next tick is only awaited once the
//! current one has finished, so ticks never overlap. When a tick takes
//! longer than the period, the missed ticks are dropped instead of being
//! replayed back to back.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};
use log::{error, info, warn};

use super::{Engine, TickOutcome};
use crate::sensors::{RawSample, SampleSource};
use crate::storage::BucketStore;
use crate::time::WallClock;

/// Signal used to stop [`run`]
pub type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Counters collected while the driver runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub ticks: u32,
    pub published: u32,
    pub skipped: u32,
    pub acquisition_failures: u32,
    pub persistence_failures: u32,
    pub overruns: u32,
}

/// Drive `engine` every `tick_period_ms` until `stop` is signaled.
pub async fn run<S, Src, C>(
    engine: &mut Engine<'_, S>,
    source: &mut Src,
    clock: &C,
    stop: &StopSignal,
) -> DriverStats
where
    S: BucketStore,
    Src: SampleSource,
    C: WallClock,
{
    let period = Duration::from_millis(engine.config().tick_period_ms);
    let mut ticker = Ticker::every(period);
    let mut stats = DriverStats::default();

    info!("Tick driver started, period {} ms", period.as_millis());

    loop {
        if let Either::Second(()) = select(ticker.next(), stop.wait()).await {
            info!("Tick driver stopped after {} tick(s)", stats.ticks);
            return stats;
        }

        let started = Instant::now();
        stats.ticks += 1;

        match source.read().await {
            Ok(reading) => {
                let sample = RawSample::from_reading(reading, clock.now());
                match engine.tick(sample).await {
                    Ok(TickOutcome::Published(_)) => stats.published += 1,
                    Ok(TickOutcome::Skipped) => stats.skipped += 1,
                    Err(e) => {
                        error!("Tick at {} failed: {}", sample.timestamp, e);
                        stats.persistence_failures += 1;
                    }
                }
            }
            Err(e) => {
                warn!("Sensor read failed, skipping tick: {}", e);
                stats.acquisition_failures += 1;
            }
        }

        let elapsed = started.elapsed();
        if elapsed > period {
            warn!(
                "Tick took {} ms, longer than the {} ms period",
                elapsed.as_millis(),
                period.as_millis()
            );
            stats.overruns += 1;
            ticker.reset();
        }
    }
}
