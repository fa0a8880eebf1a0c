//! Desktop simulator for the lumen-rs rollup engine.
//!
//! Feeds synthetic light/motion readings through the tick driver, logs the
//! engine events, and prints a full readout of the collected history when the
//! run ends.
//!
//! # Environment
//!
//! | Variable                     | Meaning                       | Default |
//! |------------------------------|-------------------------------|---------|
//! | `LUMEN_TICK_MS`              | Tick period in milliseconds   | 1000    |
//! | `LUMEN_UTC_OFFSET_SECS`      | Local time offset from UTC    | 0       |
//! | `LUMEN_RUN_SECS`             | How long to run               | 180     |
//! | `LUMEN_PUBLISH_INTERVAL_SECS`| Minimum spacing of publishes  | 5       |
//!
//! Variables can also be placed in a `.env` file.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use embassy_futures::block_on;
use embassy_futures::join::join3;
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use log::{error, info, warn};

use lumen_rs::config::EngineConfig;
use lumen_rs::engine::driver::{self, StopSignal};
use lumen_rs::engine::{Engine, EngineEvent, EventChannel};
use lumen_rs::momentary::LatestMomentary;
use lumen_rs::readout::{Field, FieldValue, Readout, ReadoutRequest, ReadoutSink};
use lumen_rs::sensors::{Reading, SampleSource, SensorError};
use lumen_rs::storage::MemoryStore;
use lumen_rs::time::WallClock;

// ---------------------------------------------------------------------------
// Mock hardware
// ---------------------------------------------------------------------------

/// Every this many reads the light sensor glitches to full scale.
const GLITCH_EVERY: u64 = 47;

/// Every this many reads the sensor is not ready.
const NOT_READY_EVERY: u64 = 113;

/// Synthetic light sensor with a PIR motion output
struct SyntheticLightSensor {
    reads: u64,
    /// LCG state for measurement noise
    noise: u32,
}

impl SyntheticLightSensor {
    fn new() -> Self {
        Self {
            reads: 0,
            noise: 0x2545_f491,
        }
    }

    fn next_noise(&mut self) -> f64 {
        self.noise = self.noise.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (self.noise >> 16) as f64 / 65536.0 - 0.5
    }
}

impl SampleSource for SyntheticLightSensor {
    async fn read(&mut self) -> Result<Reading, SensorError> {
        self.reads += 1;
        let t = self.reads as f64;

        if self.reads % NOT_READY_EVERY == 0 {
            return Err(SensorError::NotReady);
        }

        // 10-bit ADC: slow daylight swing plus noise
        let level = 520.0 + 300.0 * (t / 240.0).sin() + 12.0 * self.next_noise();
        let primary = if self.reads % GLITCH_EVERY == 0 {
            1023
        } else {
            level.clamp(0.0, 1023.0) as i32
        };

        // Someone walks by for 20 s every 90 s
        let companion = self.reads % 90 < 20;

        Ok(Reading { primary, companion })
    }
}

struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as u32
    }
}

/// Readout sink printing every field
struct LogSink {
    batches: usize,
}

impl ReadoutSink for LogSink {
    fn report(&mut self, fields: &[Field], done: bool) {
        self.batches += 1;
        for field in fields {
            match &field.value {
                FieldValue::Quantity {
                    value,
                    decimals,
                    unit,
                } => info!(
                    "{:>10} {}: {:.*} {}",
                    field.timestamp,
                    field.name,
                    *decimals as usize,
                    value,
                    unit
                ),
                FieldValue::Boolean(value) => {
                    info!("{:>10} {}: {}", field.timestamp, field.name, value)
                }
            }
        }
        if done {
            info!("Readout complete in {} batch(es)", self.batches);
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring {}={:?}, using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn load_config() -> (EngineConfig, u64) {
    let defaults = EngineConfig::default();
    let config = EngineConfig {
        tick_period_ms: env_or("LUMEN_TICK_MS", defaults.tick_period_ms),
        utc_offset_secs: env_or("LUMEN_UTC_OFFSET_SECS", defaults.utc_offset_secs),
        publish_interval_secs: env_or(
            "LUMEN_PUBLISH_INTERVAL_SECS",
            defaults.publish_interval_secs,
        ),
        ..defaults
    };
    let run_secs = env_or("LUMEN_RUN_SECS", 180u64);
    (config, run_secs)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting lumen-rs simulator");
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let (config, run_secs) = load_config();
    info!(
        "Tick {} ms, UTC offset {} s, running for {} s",
        config.tick_period_ms, config.utc_offset_secs, run_secs
    );

    let store = MemoryStore::new();
    let latest = LatestMomentary::new();
    let events = EventChannel::new();
    let stop_driver = StopSignal::new();
    let stop_monitor: Signal<CriticalSectionRawMutex, ()> = Signal::new();

    let publisher = match events.publisher() {
        Ok(publisher) => publisher,
        Err(e) => {
            error!("No event publisher available: {:?}", e);
            return;
        }
    };
    let mut subscriber = match events.subscriber() {
        Ok(subscriber) => subscriber,
        Err(e) => {
            error!("No event subscriber available: {:?}", e);
            return;
        }
    };

    let channel = config.channel.clone();
    let mut engine = match Engine::new(config, &store, &latest, publisher) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    let mut sensor = SyntheticLightSensor::new();
    let clock = SystemClock;

    let (stats, (), ()) = block_on(join3(
        driver::run(&mut engine, &mut sensor, &clock, &stop_driver),
        async {
            Timer::after(Duration::from_secs(run_secs)).await;
            stop_driver.signal(());
            stop_monitor.signal(());
        },
        async {
            loop {
                match select(subscriber.next_message_pure(), stop_monitor.wait()).await {
                    Either::First(EngineEvent::Publish(value)) => info!(
                        "{}: {:.2} {}, {}: {}",
                        channel.primary_name,
                        value.primary,
                        channel.unit,
                        channel.companion_name,
                        value.companion
                    ),
                    Either::First(EngineEvent::SpikeRemoved { value, timestamp }) => {
                        info!("Spike {} rejected at {}", value, timestamp)
                    }
                    Either::First(EngineEvent::BucketClosed(bucket)) => info!("Stored {}", bucket),
                    Either::First(EngineEvent::Momentary(_)) => {}
                    Either::Second(()) => break,
                }
            }
        },
    ));

    info!(
        "Ran {} tick(s): {} published, {} skipped, {} read failure(s), {} store failure(s), {} overrun(s)",
        stats.ticks,
        stats.published,
        stats.skipped,
        stats.acquisition_failures,
        stats.persistence_failures,
        stats.overruns
    );

    let readout = Readout::new(&channel, &store, &latest);
    let mut sink = LogSink { batches: 0 };
    if let Err(e) = block_on(readout.execute(&ReadoutRequest::all(0, u32::MAX), &mut sink)) {
        error!("Readout failed: {}", e);
    }

    info!("Simulator exiting");
}
