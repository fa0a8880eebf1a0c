//! Streaming rollup engine for lumen-rs
//!
//! This crate turns a stream of raw sensor readings into a smoothed momentary
//! value and a persistent minute/hour/day history: outlier rejection over a
//! sliding window, per-minute aggregation, cascading compaction into coarser
//! buckets, and retention pruning.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod config;
pub mod engine;
pub mod filter;
pub mod momentary;
pub mod readout;
pub mod sensors;
pub mod storage;
pub mod time;

#[cfg(test)]
pub(crate) mod test_support;

/// Copy `text` into a fixed-capacity string, dropping whatever does not fit.
pub(crate) fn truncated<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
