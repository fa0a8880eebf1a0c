/// Default number of raw readings kept in the window
pub const WINDOW_SIZE: usize = 10;

/// Fixed-capacity circular buffer of recent raw readings
///
/// Logical index `0` is the oldest slot and `N - 1` the newest. Every push
/// shifts all entries one step towards index `0`, whether or not they were
/// removed in the meantime. A removed entry stays in place as an empty slot
/// until it ages out.
///
/// `sum` and `count` always describe exactly the entries that are present.
#[derive(Debug, Clone)]
pub struct SampleWindow<const N: usize = WINDOW_SIZE> {
    slots: [Option<i32>; N],
    /// Physical position of logical index 0
    head: usize,
    sum: i64,
    count: usize,
}

impl<const N: usize> SampleWindow<N> {
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            head: 0,
            sum: 0,
            count: 0,
        }
    }

    /// Number of present entries
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Sum over present entries
    pub const fn sum(&self) -> i64 {
        self.sum
    }

    const fn physical(&self, index: usize) -> usize {
        (self.head + index) % N
    }

    /// Append a reading at the newest position.
    ///
    /// Returns the evicted oldest slot. The slot itself may be empty, since
    /// the window starts empty and entries can be removed.
    pub fn push(&mut self, value: i32) -> Option<i32> {
        if N == 0 {
            return None;
        }

        // The oldest slot is reused for the newest entry.
        let oldest = self.head;
        let evicted = self.slots[oldest].take();
        if let Some(old) = evicted {
            self.sum -= old as i64;
            self.count -= 1;
        }

        self.slots[oldest] = Some(value);
        self.sum += value as i64;
        self.count += 1;
        self.head = (self.head + 1) % N;

        evicted
    }

    /// Entry at logical `index`, `None` if out of range or empty
    pub fn get(&self, index: usize) -> Option<i32> {
        if index >= N {
            return None;
        }
        self.slots[self.physical(index)]
    }

    /// Remove the entry at logical `index`, leaving an empty slot
    pub fn remove(&mut self, index: usize) -> Option<i32> {
        if index >= N {
            return None;
        }
        let removed = self.slots[self.physical(index)].take();
        if let Some(value) = removed {
            self.sum -= value as i64;
            self.count -= 1;
        }
        removed
    }

    /// Mean of the present entries, `None` when the window holds none
    pub fn average(&self) -> Option<f32> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum as f32 / self.count as f32)
        }
    }

    /// Present entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        (0..N).filter_map(move |i| self.get(i))
    }

    /// Mean of the present entries in the older half, indices `0..N/2`
    pub fn older_half_mean(&self) -> Option<f32> {
        self.mean_of(0, N / 2)
    }

    /// Mean of the present entries at logical indices `start..end`
    pub fn mean_of(&self, start: usize, end: usize) -> Option<f32> {
        let (sum, n) = (start..end.min(N))
            .filter_map(|i| self.get(i))
            .fold((0i64, 0usize), |(sum, n), v| (sum + v as i64, n + 1));
        if n == 0 {
            None
        } else {
            Some(sum as f32 / n as f32)
        }
    }
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}
