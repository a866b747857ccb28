//! A width-bounded counter array with a reversible snapshot log.
//!
//! Every predictor owns up to two of these (a local history table and a
//! pattern history table, spec.md §3). Each entry is masked to a configured
//! bit width on write, mirroring the original's `uint32_t` arrays combined
//! with an explicit `mask` applied after every shift-and-inject update
//! (`local_predictor.h`'s `m_lht`/`m_pht`).

use std::collections::VecDeque;

use ripes_support::bits::bitmask;

/// A fixed-size array of saturating/rotating counters, each `width` bits
/// wide, with a bounded undo log of whole-array snapshots.
#[derive(Debug, Clone)]
pub struct HistoryArray {
    width: u32,
    mask: u64,
    values: Vec<u32>,
    snapshots: VecDeque<Vec<u32>>,
    max_snapshots: usize,
}

impl HistoryArray {
    /// A new array of `len` counters, each `width` bits wide, all zeroed.
    #[must_use]
    pub fn new(len: usize, width: u32, max_snapshots: usize) -> Self {
        Self {
            width,
            mask: bitmask(width),
            values: vec![0; len],
            snapshots: VecDeque::new(),
            max_snapshots,
        }
    }

    /// The bit width each counter is masked to.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The number of counters in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the array is empty (always false for an array built by `new`
    /// with `len > 0`, but kept for API completeness alongside `len`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads counter `idx`, masked to this array's width.
    #[must_use]
    pub fn get(&self, idx: usize) -> u32 {
        self.values[idx]
    }

    /// Overwrites counter `idx`, masking the new value to this array's
    /// width.
    pub fn set(&mut self, idx: usize, value: u32) {
        self.values[idx] = (u64::from(value) & self.mask) as u32;
    }

    /// Pushes the current contents onto the undo log, dropping the oldest
    /// snapshot once `max_snapshots` is exceeded.
    pub fn save(&mut self) {
        self.snapshots.push_back(self.values.clone());
        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
        }
    }

    /// Pops the most recent snapshot and restores it. A no-op if the log is
    /// empty, matching spec.md §4.10's "if the deque is empty, the call is a
    /// no-op".
    pub fn restore(&mut self) {
        if let Some(prev) = self.snapshots.pop_back() {
            self.values = prev;
        }
    }

    /// Updates the maximum number of retained snapshots, trimming the log
    /// from the front if it now exceeds the new bound.
    pub fn set_max_snapshots(&mut self, max_snapshots: usize) {
        self.max_snapshots = max_snapshots;
        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
        }
    }

    /// Zeroes every counter and discards the undo log.
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0);
        self.snapshots.clear();
    }
}
