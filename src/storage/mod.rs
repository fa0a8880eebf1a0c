pub mod accumulator;
pub mod bucket;
pub mod compactor;
pub mod memory;
pub mod query;
pub mod retention;
pub mod store;

pub use bucket::*;
pub use memory::MemoryStore;
pub use store::{BucketStore, StoreError, TimeRange};

use serde::{Deserialize, Serialize};

/// Summary resolution of a persisted bucket
///
/// Minute buckets are built from smoothed samples, hour buckets from minute
/// buckets and day buckets from hour buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// One bucket per wall-clock minute
    Minute,
    /// One bucket per wall-clock hour
    Hour,
    /// One bucket per local day
    Day,
}

impl Resolution {
    /// All resolutions, finest first
    pub const ALL: [Resolution; 3] = [Self::Minute, Self::Hour, Self::Day];

    /// Get a short label for field names and logs
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minute => "Minute",
            Self::Hour => "Hour",
            Self::Day => "Day",
        }
    }

    /// Get the length of one bucket window in seconds
    pub const fn duration_secs(self) -> u32 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3600,
            Self::Day => 86400,
        }
    }

    /// The resolution this one is compacted from
    pub const fn finer(self) -> Option<Self> {
        match self {
            Self::Minute => None,
            Self::Hour => Some(Self::Minute),
            Self::Day => Some(Self::Hour),
        }
    }

    /// The resolution this one compacts into
    pub const fn coarser(self) -> Option<Self> {
        match self {
            Self::Minute => Some(Self::Hour),
            Self::Hour => Some(Self::Day),
            Self::Day => None,
        }
    }

    /// Maximum number of finer buckets that make up one bucket of this resolution
    pub const fn max_sources(self) -> usize {
        match self {
            Self::Minute => 0,
            Self::Hour => 60,
            Self::Day => 24,
        }
    }
}
