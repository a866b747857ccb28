//! The local (per-address) 2-level predictor.
//!
//! Grounded in `local_predictor.h`: `2^a` per-address history entries, each
//! `h` bits wide, index a `2^h`-entry table of `s`-bit saturating counters.
//! A branch's low `a` address bits (after discarding the 2-bit word
//! alignment, matching the cache's addressing convention in spec.md §4.9)
//! select which history entry it reads and updates.

use ripes_support::bits::bitmask;
use ripes_support::AInt;

use crate::counters::AccuracyCounters;
use crate::history::HistoryArray;
use crate::predictor::Predictor;

/// A 2-level predictor indexed by per-address branch history (spec.md
/// §4.10's "Local" row: `lht` size `2^a` of `h`-bit entries, `pht` size
/// `2^h` of `s`-bit entries).
#[derive(Debug, Clone)]
pub struct LocalPredictor {
    addr_bits: u32,
    history_bits: u32,
    counter_bits: u32,
    lht: HistoryArray,
    pht: HistoryArray,
    counters: AccuracyCounters,
    reverse_stack_depth: usize,
}

impl LocalPredictor {
    /// A fresh predictor with `2^a` per-address history entries (each `h`
    /// bits wide) and `2^h` saturating counters (each `s` bits wide), all
    /// starting at `0` (`resetPredictorState` zeroes both arrays in the
    /// original), retaining `reverse_stack_depth` snapshots.
    #[must_use]
    pub fn new(addr_bits: u32, history_bits: u32, counter_bits: u32, reverse_stack_depth: usize) -> Self {
        let lht_len = 1usize << addr_bits;
        let pht_len = 1usize << history_bits;
        Self {
            addr_bits,
            history_bits,
            counter_bits,
            lht: HistoryArray::new(lht_len, history_bits, reverse_stack_depth),
            pht: HistoryArray::new(pht_len, counter_bits, reverse_stack_depth),
            counters: AccuracyCounters::default(),
            reverse_stack_depth,
        }
    }

    fn addr_index(&self, addr: AInt) -> usize {
        let mask = bitmask(self.addr_bits);
        ((addr >> 2) & mask) as usize
    }
}

impl Default for LocalPredictor {
    fn default() -> Self {
        Self::new(4, 4, 2, 1024)
    }
}

fn upper_half(value: u32, width: u32) -> bool {
    (value >> (width - 1)) != 0
}

impl Predictor for LocalPredictor {
    fn predict(&mut self, addr: AInt, _is_branch: bool, _is_conditional: bool) -> bool {
        let idx = self.addr_index(addr);
        let history = self.lht.get(idx) as usize;
        upper_half(self.pht.get(history), self.counter_bits)
    }

    fn update(
        &mut self,
        addr: AInt,
        predicted_taken: bool,
        was_miss: bool,
        _is_branch: bool,
        is_conditional: bool,
    ) {
        self.counters.record(is_conditional, was_miss);
        if !is_conditional {
            return;
        }
        let actual_taken = predicted_taken != was_miss;
        let addr_idx = self.addr_index(addr);
        let history = self.lht.get(addr_idx) as usize;

        let max = bitmask(self.counter_bits) as u32;
        let current = self.pht.get(history);
        let updated = if actual_taken {
            current.saturating_add(1).min(max)
        } else {
            current.saturating_sub(1)
        };
        self.pht.set(history, updated);

        let history_mask = bitmask(self.history_bits) as u32;
        let injected = u32::from(actual_taken) << (self.history_bits - 1);
        let shifted = ((history as u32) >> 1) | injected;
        self.lht.set(addr_idx, shifted & history_mask);
    }

    fn save_state(&mut self) {
        self.lht.save();
        self.pht.save();
    }

    fn restore_state(&mut self) {
        self.lht.restore();
        self.pht.restore();
    }

    fn reset_state(&mut self) {
        self.lht.reset();
        self.pht.reset();
    }

    fn reset_counters(&mut self) {
        self.counters.reset();
    }

    fn set_reverse_stack_depth(&mut self, depth: usize) {
        self.reverse_stack_depth = depth;
        self.lht.set_max_snapshots(depth);
        self.pht.set_max_snapshots(depth);
    }

    fn counters(&self) -> AccuracyCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_addresses_keep_independent_history() {
        let mut p = LocalPredictor::new(4, 3, 2, 8);
        assert_ne!(p.addr_index(0x00), p.addr_index(0x04));

        p.update(0x00, false, true, true, true); // actual taken at addr 0
        p.update(0x04, false, false, true, true); // actual not-taken at addr 1

        assert_eq!(p.lht.get(p.addr_index(0x00)), 0b100);
        assert_eq!(p.lht.get(p.addr_index(0x04)), 0);
    }

    #[test]
    fn save_restore_round_trips_both_arrays() {
        let mut p = LocalPredictor::default();
        p.save_state();
        p.update(0x100, false, true, true, true);
        p.restore_state();
        assert_eq!(p.lht.get(p.addr_index(0x100)), 0);
    }
}
