use super::window::SampleWindow;
use log::info;

/// Result of running the filter over the window for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOutcome {
    /// Raw value taken out of the window this tick, if any
    pub removed: Option<i32>,
    /// Mean of the older half of the window, `None` when that half is empty
    pub mean: Option<f32>,
}

/// Single-outlier rejection over a [`SampleWindow`]
///
/// The heuristic is deliberately cheap: it never sorts the window. When
/// exactly one present reading lies strictly below (or above) the window
/// average, and the reading in the middle slot is on that side, the middle
/// reading is treated as a spike and removed. Each reading passes through
/// the middle slot once, so every reading gets one chance to be rejected
/// before it reaches the older half that feeds the published value.
///
/// Two simultaneous outliers are not detected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpikeFilter;

impl SpikeFilter {
    /// Fixed slot inspected for a spike
    pub const fn middle<const N: usize>() -> usize {
        N / 2
    }

    /// Minimum number of present readings before detection is trusted
    pub const fn min_present<const N: usize>() -> usize {
        N.saturating_sub(2)
    }

    /// Remove at most one spike from the window. Returns the removed value.
    pub fn reject_spike<const N: usize>(&self, window: &mut SampleWindow<N>) -> Option<i32> {
        if window.count() < Self::min_present::<N>() {
            return None;
        }
        let avg = window.average()?;

        let mut below = 0usize;
        let mut above = 0usize;
        for value in window.iter() {
            let value = value as f32;
            if value < avg {
                below += 1;
            } else if value > avg {
                above += 1;
            }
        }

        if below != 1 && above != 1 {
            return None;
        }

        let middle = Self::middle::<N>();
        let candidate = window.get(middle)? as f32;
        let is_spike = (below == 1 && candidate < avg) || (above == 1 && candidate > avg);
        if !is_spike {
            return None;
        }

        let removed = window.remove(middle);
        if let Some(value) = removed {
            info!("Spike removed: {} (window avg {:.1})", value, avg);
        }
        removed
    }

    /// Reject a spike, then compute the mean of the older half
    pub fn apply<const N: usize>(&self, window: &mut SampleWindow<N>) -> FilterOutcome {
        let removed = self.reject_spike(window);
        let mean = window.older_half_mean();
        FilterOutcome { removed, mean }
    }
}
