//! The global (gshare-style) 2-level predictor.
//!
//! Grounded in `global_predictor.h`: a single `h`-bit global history
//! register indexes a `2^h`-entry table of `s`-bit saturating counters
//! shared by every conditional branch in the program.

use ripes_support::bits::bitmask;
use ripes_support::AInt;

use crate::counters::AccuracyCounters;
use crate::history::HistoryArray;
use crate::predictor::Predictor;

/// A 2-level predictor indexed purely by global branch history (spec.md
/// §4.10's "Global" row: `lht` size 1, `pht` size `2^h`, `s` bits).
#[derive(Debug, Clone)]
pub struct GlobalPredictor {
    history_bits: u32,
    counter_bits: u32,
    /// The global history register, held as a single-entry array so it
    /// shares `HistoryArray`'s save/restore machinery with every other
    /// predictor.
    lht: HistoryArray,
    pht: HistoryArray,
    counters: AccuracyCounters,
    reverse_stack_depth: usize,
}

impl GlobalPredictor {
    /// A fresh predictor with an `h`-bit global history register and
    /// `2^h` entries of `s`-bit saturating counters, all starting at `0`
    /// (`resetPredictorState` zeroes both arrays in the original),
    /// retaining `reverse_stack_depth` snapshots.
    #[must_use]
    pub fn new(history_bits: u32, counter_bits: u32, reverse_stack_depth: usize) -> Self {
        let pht_len = 1usize << history_bits;
        Self {
            history_bits,
            counter_bits,
            lht: HistoryArray::new(1, history_bits, reverse_stack_depth),
            pht: HistoryArray::new(pht_len, counter_bits, reverse_stack_depth),
            counters: AccuracyCounters::default(),
            reverse_stack_depth,
        }
    }

    fn history(&self) -> usize {
        self.lht.get(0) as usize
    }
}

impl Default for GlobalPredictor {
    fn default() -> Self {
        Self::new(4, 2, 1024)
    }
}

fn upper_half(value: u32, width: u32) -> bool {
    (value >> (width - 1)) != 0
}

impl Predictor for GlobalPredictor {
    fn predict(&mut self, _addr: AInt, _is_branch: bool, _is_conditional: bool) -> bool {
        upper_half(self.pht.get(self.history()), self.counter_bits)
    }

    fn update(
        &mut self,
        _addr: AInt,
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
        let idx = self.history();
        let max = bitmask(self.counter_bits) as u32;
        let current = self.pht.get(idx);
        let updated = if actual_taken {
            current.saturating_add(1).min(max)
        } else {
            current.saturating_sub(1)
        };
        self.pht.set(idx, updated);

        let history_mask = bitmask(self.history_bits) as u32;
        let injected = u32::from(actual_taken) << (self.history_bits - 1);
        let shifted = ((self.history() as u32) >> 1) | injected;
        self.lht.set(0, shifted & history_mask);
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
    fn history_shifts_in_the_actual_outcome() {
        let mut p = GlobalPredictor::new(3, 2, 8);
        assert_eq!(p.history(), 0);
        // predicted not taken, was a miss => actual taken.
        p.update(0, false, true, true, true);
        assert_eq!(p.history(), 0b100);
        p.update(0, false, true, true, true);
        assert_eq!(p.history(), 0b110);
    }

    #[test]
    fn save_restore_round_trips_both_arrays() {
        let mut p = GlobalPredictor::default();
        p.save_state();
        p.update(0, false, true, true, true);
        let after_update = p.history();
        assert_ne!(after_update, 0);
        p.restore_state();
        assert_eq!(p.history(), 0);
    }
}
