use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

use crate::momentary::MomentaryValue;
use crate::storage::Bucket;

/// Channel capacity for engine events
/// Publishing never blocks the tick; slow subscribers lag instead.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Number of subscribers that can listen to engine events
/// - Subscriber 0: protocol front end (live display / sensor-data channel)
/// - Subscriber 1: diagnostics or a second front end
pub const EVENT_SUBSCRIBERS: usize = 2;

/// Number of publishers (one engine per channel)
pub const EVENT_PUBLISHERS: usize = 1;

/// Events published by the engine to notify front ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// A tick produced a smoothed value
    Momentary(MomentaryValue),
    /// A momentary value passed the publish throttle
    Publish(MomentaryValue),
    /// A raw reading was rejected as a spike
    SpikeRemoved { value: i32, timestamp: u32 },
    /// A bucket was finalized and persisted
    BucketClosed(Bucket),
}

pub type EventChannel = PubSubChannel<
    CriticalSectionRawMutex,
    EngineEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

pub type EventPublisher<'a> = Publisher<
    'a,
    CriticalSectionRawMutex,
    EngineEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

pub type EventSubscriber<'a> = Subscriber<
    'a,
    CriticalSectionRawMutex,
    EngineEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;
