//! Raw reading smoothing: the sample window and the spike filter that
//! reads it.

pub mod spike;
pub mod window;

pub use spike::{FilterOutcome, SpikeFilter};
pub use window::{SampleWindow, WINDOW_SIZE};
